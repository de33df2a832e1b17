use std::env;
use std::process::Command;

/// Trimmed stdout of a git command, `None` outside a checkout.
fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// `SOURCE_DATE_EPOCH` wins so packaged builds are reproducible; then the
/// commit date; then the current time.
fn build_date() -> String {
    if let Ok(epoch) = env::var("SOURCE_DATE_EPOCH") {
        return epoch;
    }
    git(&["show", "-s", "--format=%cs", "HEAD"]).unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|_| "unknown".into())
    })
}

fn main() {
    let revision = git(&["describe", "--always", "--dirty", "--abbrev=12"])
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_SHA={revision}");
    println!("cargo:rustc-env=BUILD_DATE={}", build_date());
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
