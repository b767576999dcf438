use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::CliTest;

const USERS_CONTROLLER: &str = r#"module Admin
  class UsersController < ApplicationController
    def index
      @title = t('.title')
      flash[:notice] = I18n.t(:created, scope: 'admin.users', count: 1)
    end

    private

    def load_user
      # i18n-tasks-use t('admin.users.missing')
      User.find_by!(id: params[:id])
    end
  end
end
"#;

#[test]
fn test_scan_text_output() -> Result<()> {
    let test = CliTest::with_file(
        "app/models/user.rb",
        r#"class User
  def greeting
    t('welcome.title')
  end
end
"#,
    )?;

    assert_cmd_snapshot!(test.scan_command(), @r#"
    success: true
    exit_code: 0
    ----- stdout -----
    app/models/user.rb
      3:5  t  "welcome.title"  User#greeting

    ✓ Scanned 1 file, found 1 translation call

    ----- stderr -----
    "#);

    Ok(())
}

#[test]
fn test_scan_empty_project() -> Result<()> {
    let test = CliTest::new()?;

    assert_cmd_snapshot!(test.scan_command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    ✓ Scanned 0 files, found 0 translation calls

    ----- stderr -----
    ");

    Ok(())
}

#[test]
fn test_scan_json_output() -> Result<()> {
    let test = CliTest::with_file("app/controllers/admin/users_controller.rb", USERS_CONTROLLER)?;

    let (output, json) = test.scan_json()?;
    assert!(output.status.success());

    assert_eq!(
        json["summary"],
        json!({ "filesScanned": 1, "translationCalls": 3, "failedFiles": 0 })
    );

    let file = &json["files"][0];
    assert_eq!(file["filePath"], "app/controllers/admin/users_controller.rb");

    let usages = file["usages"].as_array().unwrap();
    let keys: Vec<_> = usages.iter().map(|u| u["key"].clone()).collect();
    assert_eq!(
        keys,
        vec![
            json!(".title"),
            json!("created"),
            json!("admin.users.missing")
        ]
    );

    assert_eq!(usages[0]["line"], 4);
    assert_eq!(usages[0]["scope"], json!(["Admin", "UsersController"]));
    assert_eq!(usages[0]["definition"], "index");
    assert_eq!(usages[0]["private"], false);

    assert_eq!(usages[1]["receiver"], "I18n");
    assert_eq!(usages[1]["options"], json!(["scope", "count"]));

    assert_eq!(usages[2]["line"], 11);
    assert_eq!(usages[2]["definition"], "load_user");
    assert_eq!(usages[2]["private"], true);
    assert_eq!(usages[2]["fromComment"], true);

    Ok(())
}

#[test]
fn test_scan_finds_calls_inside_ordinary_calls() -> Result<()> {
    let test = CliTest::with_file(
        "app/controllers/posts_controller.rb",
        r#"class PostsController < ApplicationController
  def create
    redirect_to posts_path, notice: t('.created')
  end

  def index
    @labels = Post.all.map { |post| t("posts.states.#{post.state}") + t('posts.suffix') }
  end
end
"#,
    )?;

    let (output, json) = test.scan_json()?;
    assert!(output.status.success());

    let usages = json["files"][0]["usages"].as_array().unwrap();
    let found: Vec<_> = usages
        .iter()
        .map(|u| (u["key"].clone(), u["definition"].clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            (json!(".created"), json!("create")),
            (json!("posts.suffix"), json!("index")),
        ]
    );

    Ok(())
}

#[test]
fn test_scan_reports_failed_files() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("app/models/ok.rb", "t('ok')\n")?;
    test.write_file("app/models/broken.rb", "def broken(\n")?;
    test.write_file("app/models/splat.rb", "t(:a, **options)\n")?;

    let (output, json) = test.scan_json()?;
    assert_eq!(output.status.code(), Some(1));

    assert_eq!(json["summary"]["filesScanned"], 3);
    assert_eq!(json["summary"]["failedFiles"], 2);
    assert_eq!(json["failures"][0]["filePath"], "app/models/broken.rb");
    assert_eq!(json["failures"][1]["filePath"], "app/models/splat.rb");
    assert_eq!(json["files"][0]["usages"][0]["key"], "ok");

    Ok(())
}

#[test]
fn test_scan_failure_hint_in_text_mode() -> Result<()> {
    let test = CliTest::with_file("lib/broken.rb", "class (\n")?;

    assert_cmd_snapshot!(test.scan_command(), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    ✓ Scanned 1 file, found 0 translation calls

    ----- stderr -----
    warning: 1 file(s) could not be analyzed (use -v for details)
    ");

    Ok(())
}

#[test]
fn test_scan_verbose_shows_failure_details() -> Result<()> {
    let test = CliTest::with_file("lib/broken.rb", "class (\n")?;

    let output = test.scan_command().arg("-v").output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("lib/broken.rb"), "stderr: {}", stderr);
    assert!(stderr.contains("Syntax error"), "stderr: {}", stderr);

    Ok(())
}

#[test]
fn test_scan_uses_config() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(
        ".glotrc.json",
        r#"{
          "includes": ["lib"],
          "translationMethods": ["tt"],
          "magicComments": false
        }"#,
    )?;
    test.write_file("app/models/user.rb", "t('not.scanned')\n")?;
    test.write_file(
        "lib/report.rb",
        "# i18n-tasks-use t('ignored.comment')\ntt('custom.key')\n",
    )?;

    let (output, json) = test.scan_json()?;
    assert!(output.status.success());

    assert_eq!(json["summary"]["filesScanned"], 1);
    let usages = json["files"][0]["usages"].as_array().unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0]["key"], "custom.key");
    assert_eq!(usages[0]["method"], "tt");

    Ok(())
}

#[test]
fn test_scan_ignores_test_files() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file("app/models/user.rb", "t('a')\n")?;
    test.write_file("app/models/user_spec.rb", "t('b')\n")?;

    let (_, json) = test.scan_json()?;
    assert_eq!(json["summary"]["filesScanned"], 1);
    assert_eq!(json["files"][0]["filePath"], "app/models/user.rb");

    Ok(())
}

#[test]
fn test_scan_config_ignores() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".glotrc.json", r#"{ "ignores": ["**/generated/**"] }"#)?;
    test.write_file("app/generated/schema.rb", "t('generated')\n")?;
    test.write_file("app/models/user.rb", "t('kept')\n")?;

    let (_, json) = test.scan_json()?;
    assert_eq!(json["summary"]["filesScanned"], 1);
    assert_eq!(json["files"][0]["usages"][0]["key"], "kept");

    Ok(())
}

#[test]
fn test_scan_path_argument() -> Result<()> {
    let test = CliTest::with_file("project/app/a.rb", "t('from.path')\n")?;

    let output = test.scan_command().args(["project", "--json"]).output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["files"][0]["filePath"], "app/a.rb");

    Ok(())
}

#[test]
fn test_scan_invalid_config() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".glotrc.json", r#"{ "ignores": ["[invalid"] }"#)?;

    let output = test.scan_command().output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Invalid glob pattern in 'ignores'"), "stderr: {}", stderr);

    Ok(())
}

#[test]
fn test_help() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("--help").output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("scan"));
    assert!(stdout.contains("init"));

    Ok(())
}
