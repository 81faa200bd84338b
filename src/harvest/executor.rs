use crate::harvest::catalog::PageReference;
use crate::harvest::error::HarvestError;

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// AppleScript template driving the rendering browser. The page is opened,
/// given time to finish loading its review widget, then the rendered text
/// is selected and copied to the clipboard for pickup.
const SCRIPT_TEMPLATE: &str = r#"tell application "Safari"
    activate
    open location "{{URL}}"
end tell

delay {{WAIT_SECONDS}}

tell application "System Events"
    tell process "Safari"
        keystroke "a" using command down
        keystroke "c" using command down
    end tell
end tell
"#;

/// Contract the scheduler consumes: render one page and return its text.
///
/// A single fallible blocking operation with no retries of its own; the
/// sequential scheduling loop guarantees at most one invocation is in
/// flight, which is what the shared clipboard channel requires.
pub trait PageFetcher {
    /// Fetch the rendered text of one review page
    fn fetch(&self, page: &PageReference) -> Result<String, HarvestError>;
}

/// Result of running an external command, with captured output
#[derive(Debug, Default)]
pub struct CommandOutput {
    /// The command name
    pub command: String,

    /// Arguments passed to the command
    pub args: Vec<String>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Process exit code, non-zero on failure
    pub exit_code: i32,
}

impl CommandOutput {
    /// Prepare a command to run
    pub fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// The full command line, for log output
    pub fn command_string(&self) -> String {
        format!("{} {}", self.command, self.args.join(" "))
    }

    /// Run the command to completion, capturing output and exit status
    pub fn run(&mut self) -> Result<(), HarvestError> {
        let output = Command::new(&self.command)
            .args(&self.args)
            .output()
            .map_err(|e| {
                HarvestError::FetchExecution(format!("cannot run {}: {}", self.command_string(), e))
            })?;

        self.stdout = String::from_utf8_lossy(&output.stdout).to_string();
        self.stderr = String::from_utf8_lossy(&output.stderr).to_string();
        self.exit_code = output.status.code().unwrap_or(1);

        Ok(())
    }
}

/// Shared stem for a page's artifacts: lowercased model plus a
/// zero-padded 4-digit page number
pub fn artifact_stem(model: &str, page_number: u64) -> String {
    format!("{}-{:04}", model.to_lowercase(), page_number)
}

/// Filename of the generated automation script for a page
pub fn script_filename(model: &str, page_number: u64) -> String {
    format!("{}.scpt", artifact_stem(model, page_number))
}

/// Filename of the captured page text for a page
pub fn text_filename(model: &str, page_number: u64) -> String {
    format!("{}.txt", artifact_stem(model, page_number))
}

/// Render the automation script for one page URL and wait duration
pub fn render_script(url: &str, wait_seconds: u64) -> String {
    SCRIPT_TEMPLATE
        .replace("{{URL}}", url)
        .replace("{{WAIT_SECONDS}}", &wait_seconds.to_string())
}

/// Fetches page text by driving the desktop browser through osascript
/// and reading the result back off the clipboard.
pub struct OsaScriptFetcher {
    /// Directory where generated scripts are written before invocation
    data_dir: PathBuf,

    /// Seconds the script waits for the page to render
    wait_seconds: u64,
}

impl OsaScriptFetcher {
    /// Create a fetcher writing script artifacts under the given directory
    pub fn new(data_dir: &str, wait_seconds: u64) -> Self {
        Self {
            data_dir: PathBuf::from(data_dir),
            wait_seconds,
        }
    }

    /// Write the rendered script for a page and return its path
    fn write_script(&self, page: &PageReference) -> Result<PathBuf, HarvestError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            HarvestError::ArtifactWrite(format!(
                "cannot create data dir {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let script = render_script(page.url.as_str(), self.wait_seconds);
        let path = self
            .data_dir
            .join(script_filename(&page.model, page.page_number));

        fs::write(&path, script).map_err(|e| {
            HarvestError::ArtifactWrite(format!("cannot write script {}: {}", path.display(), e))
        })?;

        debug!("wrote script for page {} to {}", page.page_number, path.display());

        Ok(path)
    }

    /// Read the captured page text off the clipboard
    fn read_clipboard(&self) -> Result<String, HarvestError> {
        let mut pbpaste = CommandOutput::new("pbpaste", &[]);
        pbpaste.run().map_err(|e| {
            HarvestError::FetchExecution(format!("cannot read clipboard: {}", e))
        })?;

        if pbpaste.exit_code != 0 {
            return Err(HarvestError::FetchExecution(format!(
                "pbpaste exited with {}: {}",
                pbpaste.exit_code, pbpaste.stderr
            )));
        }

        Ok(pbpaste.stdout)
    }
}

impl PageFetcher for OsaScriptFetcher {
    fn fetch(&self, page: &PageReference) -> Result<String, HarvestError> {
        let script_path = self.write_script(page)?;

        let path_arg = script_path.to_string_lossy().to_string();
        let mut osascript = CommandOutput::new("osascript", &[path_arg.as_str()]);

        debug!("running {}", osascript.command_string());

        osascript.run().map_err(|e| {
            HarvestError::FetchExecution(format!(
                "osascript failed for page {} ({}): {}",
                page.page_number, page.url, e
            ))
        })?;

        if osascript.exit_code != 0 {
            return Err(HarvestError::FetchExecution(format!(
                "osascript exited with {} for page {} ({}): {}",
                osascript.exit_code, page.page_number, page.url, osascript.stderr
            )));
        }

        self.read_clipboard()
    }
}

/// Write a fetched page's text artifact under the data directory
pub fn write_page_text(
    data_dir: &str,
    page: &PageReference,
    text: &str,
) -> Result<PathBuf, HarvestError> {
    let dir = Path::new(data_dir);
    fs::create_dir_all(dir).map_err(|e| {
        HarvestError::ArtifactWrite(format!("cannot create data dir {}: {}", dir.display(), e))
    })?;

    let path = dir.join(text_filename(&page.model, page.page_number));
    fs::write(&path, text).map_err(|e| {
        HarvestError::ArtifactWrite(format!("cannot write page text {}: {}", path.display(), e))
    })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::catalog::CatalogEntry;
    use tempfile::tempdir;

    #[test]
    fn test_command_output_run() {
        let mut result = CommandOutput::new("echo", &["Hello, World!"]);

        result.run().unwrap();

        assert_eq!(result.command_string(), "echo Hello, World!");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "Hello, World!\n");
        assert_eq!(result.stderr, "");
    }

    #[test]
    fn test_command_output_missing_binary_names_command() {
        let mut result = CommandOutput::new("definitely-not-a-real-binary", &["arg"]);

        let err = result.run().unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-binary arg"));
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(artifact_stem("HERO11", 7), "hero11-0007");
        assert_eq!(script_filename("hero11", 272), "hero11-0272.scpt");
        assert_eq!(text_filename("hero11", 3), "hero11-0003.txt");
    }

    #[test]
    fn test_render_script_substitutes_url_and_wait() {
        let script = render_script("https://example.com/h11.html?yoReviewsPage=2", 45);

        assert!(script.contains(r#"open location "https://example.com/h11.html?yoReviewsPage=2""#));
        assert!(script.contains("delay 45"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn test_write_script_artifact() {
        let dir = tempdir().unwrap();
        let fetcher = OsaScriptFetcher::new(dir.path().to_str().unwrap(), 30);

        let entry = CatalogEntry::new("hero11", "https://example.com/h11.html", 25, 5).unwrap();
        let page = entry.page_reference(2).unwrap();

        let path = fetcher.write_script(&page).unwrap();

        assert!(path.ends_with("hero11-0002.scpt"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("yoReviewsPage=2"));
        assert!(contents.contains("delay 30"));
    }

    #[test]
    fn test_write_page_text() {
        let dir = tempdir().unwrap();
        let entry = CatalogEntry::new("hero11", "https://example.com/h11.html", 25, 5).unwrap();
        let page = entry.page_reference(4).unwrap();

        let path = write_page_text(dir.path().to_str().unwrap(), &page, "review text").unwrap();

        assert!(path.ends_with("hero11-0004.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "review text");
    }
}
