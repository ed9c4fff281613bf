use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn note(title: &str, tags: Option<&str>, body: &str) -> String {
    let metadata = tags
        .map(|tags| {
            format!("<table><tr><td><b>Tags:</b></td><td><i>{tags}</i></td></tr></table>")
        })
        .unwrap_or_default();
    format!("<html><head><title>{title}</title></head><body><h1>{title}</h1>{metadata}<div>{body}</div></body></html>")
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn single_note_is_written_in_place() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Recipes.html", &note("Recipes", Some("food"), "Soup <b>first</b>"));
    write(dir.path(), "Other.html", &note("Other", None, "Unrelated"));

    let mut cmd = cargo_bin_cmd!("evermark");
    cmd.arg(dir.path().join("Recipes.html"));
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("Converted 1 files in"));

    let markdown = fs::read_to_string(dir.path().join("Recipes.md")).unwrap();
    assert_eq!(
        markdown,
        "---\ntitle: Recipes\ntags:\n- food\n---\n\nSoup **first**\n"
    );
    assert!(!dir.path().join("Other.md").exists());
}

#[test]
fn unreadable_neighbour_does_not_fail_single_mode() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Recipes.html", &note("Recipes", None, "Soup"));
    fs::write(dir.path().join("Broken.html"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let mut cmd = cargo_bin_cmd!("evermark");
    cmd.arg(dir.path().join("Recipes.html"));
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("Converted 1 files in"));
    assert!(dir.path().join("Recipes.md").exists());

    let mut cmd = cargo_bin_cmd!("evermark");
    cmd.arg(dir.path()).arg("-m").arg("all").arg("--test");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Broken.html"));
}

#[test]
fn all_mode_writes_notebooks_and_resources() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("Plan_files")).unwrap();
    write(dir.path(), "Plan_files/chart.png", "png");
    write(
        dir.path(),
        "Plan.html",
        &note(
            "Plan",
            Some("nb:Work"),
            "<img src=\"Plan_files/chart.png\" width=\"100\"/>",
        ),
    );
    write(
        dir.path(),
        "Index.html",
        &note("Index", None, "Start with <a href=\"Plan.html\">Plan</a>"),
    );
    let out = dir.path().join("out");

    let mut cmd = cargo_bin_cmd!("evermark");
    cmd.arg(dir.path()).arg("--mode").arg("all").arg("-o").arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "\nRoot files:\n-----------\nIndex.html\n",
        ))
        .stdout(predicate::str::contains("Converted 2 files in"));

    let plan = fs::read_to_string(out.join("Work").join("Plan.md")).unwrap();
    assert_eq!(
        plan,
        "---\ntitle: Plan\n---\n\n\
         <img src=\"../resources/Plan_files/chart.png\" alt=\"chart\" width=\"100\">\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("resources/Plan_files/chart.png")).unwrap(),
        "png"
    );

    let index = fs::read_to_string(out.join("Index.md")).unwrap();
    assert_eq!(index, "---\ntitle: Index\n---\n\nStart with [[Plan]]\n");
    assert!(!dir.path().join("Plan.md").exists());
}

#[test]
fn recursive_test_run_reports_without_writing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "A.html", &note("A", None, "<a href=\"B.html\">B</a>"));
    write(dir.path(), "B.html", &note("B", None, "<a href=\"A.html\">back</a>"));
    write(dir.path(), "C.html", &note("C", None, "Unreachable"));

    let mut cmd = cargo_bin_cmd!("evermark");
    cmd.arg(dir.path().join("A.html"))
        .arg("-m")
        .arg("recursive")
        .arg("--test");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("\nMissing files:\nC.html\nConverted 2 files in"));

    assert!(!dir.path().join("A.md").exists());
    assert!(!dir.path().join("B.md").exists());
}

#[test]
fn folder_needs_all_mode() {
    let dir = tempdir().unwrap();
    write(dir.path(), "A.html", &note("A", None, "text"));

    let mut cmd = cargo_bin_cmd!("evermark");
    cmd.arg(dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--mode single needs an .html file"));
}

#[test]
fn missing_path_fails() {
    let dir = tempdir().unwrap();

    let mut cmd = cargo_bin_cmd!("evermark");
    cmd.arg(dir.path().join("Nope.html"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error reading"));
}
