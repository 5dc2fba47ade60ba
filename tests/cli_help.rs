use assert_cmd::Command;

#[test]
fn cli_help_smoke() {
    let mut cmd = Command::cargo_bin("kira-peerqc").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn rules_show_lists_builtin_table() {
    let mut cmd = Command::cargo_bin("kira-peerqc").unwrap();
    cmd.args(["rules", "show", "--program", "epoc"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.starts_with("rules (version v1):"));
    assert!(text.contains("epoc.na\tSodium\tmedian"));
    assert!(!text.contains("istat.na"));
}

#[test]
fn rules_show_names_derived_quantities() {
    let mut cmd = Command::cargo_bin("kira-peerqc").unwrap();
    cmd.args(["rules", "show", "--program", "wbc"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("= wbc.neut/wbc.wcc*100"));
    assert!(text.contains("wbc.wcc\tWhite Cell Count\tmedian\t>=5.1"));
}
