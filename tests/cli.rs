use std::io::Write;
use std::process::{Command, Output, Stdio};

fn imapfilter(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_imapfilter"))
        .args(args)
        .env_remove("IMAPFILTER_CONFIG")
        .env_remove("IMAPFILTER_SHARE")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn config_file(code: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(code.as_bytes()).unwrap();
    file
}

#[test]
fn inline_configuration_succeeds() {
    let out = imapfilter(&["-e", "print(options.timeout, options.recover)"], "");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "60.0\tall\n");
}

#[test]
fn dry_run_flag_reaches_the_options_table() {
    let out = imapfilter(&["-n", "-e", "print(options.dryrun)"], "");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "true\n");

    let out = imapfilter(&["-e", "print(options.dryrun)"], "");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "false\n");
}

#[test]
fn dash_reads_configuration_from_stdin() {
    let out = imapfilter(&["-c", "-"], "print('from stdin')\n");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "from stdin\n");
}

#[test]
fn configuration_errors_exit_with_status_two() {
    let out = imapfilter(&["-e", "error('bad config')"], "");
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("bad config"), "stderr was: {stderr}");
    assert!(!stderr.contains("stack traceback:"), "stderr was: {stderr}");

    let out = imapfilter(&["-e", "this is not lua"], "");
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn file_errors_include_a_traceback() {
    let file = config_file(
        "local function check() error('deep') end\n\
         local function run() check() end\n\
         run()\n",
    );
    let out = imapfilter(&["-c", file.path().to_str().unwrap()], "");
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("deep"), "stderr was: {stderr}");
    assert!(stderr.contains("stack traceback:"), "stderr was: {stderr}");
}

#[test]
fn missing_configuration_file_is_fatal() {
    let out = imapfilter(&["-c", "/nonexistent/config.lua"], "");
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("cannot open /nonexistent/config.lua"),
        "stderr was: {stderr}"
    );
}

#[test]
fn interactive_mode_runs_after_configuration() {
    let file = config_file("greeting = 'hello'\n");
    let out = imapfilter(
        &["-c", file.path().to_str().unwrap(), "-i"],
        "print(greeting)\nerror('oops')\nprint(options.expunge)\n",
    );
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "> hello\n> > true\n> \n"
    );
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("<line>:1: oops"), "stderr was: {stderr}");
}

#[test]
fn interactive_end_of_input_prints_a_newline() {
    let out = imapfilter(&["-e", "", "-i"], "");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "> \n");
    assert!(out.stderr.is_empty());
}
