use std::process::Command;

fn git_short_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    for path in [".git/HEAD", ".git/refs", "migrations", "templates"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let git_sha = git_short_sha().unwrap_or_else(|| "dev".to_string());
    println!("cargo:rustc-env=TODO_WEB_GIT_SHA={git_sha}");
}
