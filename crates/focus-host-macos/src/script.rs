//! `osascript` invocation and output parsing

use focus_host_api::{HostError, HostResult, RunningApp};
use std::process::Stdio;
use tokio::process::Command;
use tracing::trace;

/// AppleScript error number for "Not authorized to send Apple events"
const ERR_NOT_PERMITTED: &str = "-1743";

/// Run an AppleScript and return its trimmed stdout.
///
/// The child is killed if the returned future is dropped, so a caller-side
/// timeout never leaves a stray `osascript` behind.
pub async fn run_osascript(script: &str) -> HostResult<String> {
    trace!(script, "Running osascript");

    let output = Command::new("osascript")
        .arg("-e")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains(ERR_NOT_PERMITTED) || stderr.contains("not allowed assistive access") {
        Err(HostError::PermissionDenied(stderr))
    } else {
        Err(HostError::ScriptFailed(stderr))
    }
}

/// Quote a value as an AppleScript string literal
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A tab addressed by 1-based window and tab index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabRef {
    pub window: usize,
    pub tab: usize,
    pub url: String,
}

/// Parse `name<TAB>frontmost` lines
pub fn parse_process_list(output: &str) -> Vec<RunningApp> {
    output
        .lines()
        .filter_map(|line| {
            let (name, frontmost) = line.rsplit_once('\t')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(RunningApp::new(name, frontmost.trim() == "true"))
        })
        .collect()
}

/// Parse `window<TAB>tab<TAB>url` lines, skipping tabs without a URL
pub fn parse_tab_list(output: &str) -> Vec<TabRef> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let window = parts.next()?.trim().parse().ok()?;
            let tab = parts.next()?.trim().parse().ok()?;
            let url = parts.next()?.trim();
            if url.is_empty() || url == "missing value" {
                return None;
            }
            Some(TabRef {
                window,
                tab,
                url: url.to_string(),
            })
        })
        .collect()
}

pub(crate) fn list_processes_script() -> String {
    r#"tell application "System Events"
    set out to ""
    repeat with p in (every application process whose background only is false)
        set out to out & (name of p) & tab & (frontmost of p) & linefeed
    end repeat
    return out
end tell"#
        .to_string()
}

pub(crate) fn frontmost_script() -> String {
    r#"tell application "System Events" to return name of first application process whose frontmost is true"#
        .to_string()
}

pub(crate) fn set_visible_script(process: &str, visible: bool) -> String {
    format!(
        r#"tell application "System Events" to set visible of application process {} to {}"#,
        quote(process),
        visible
    )
}

pub(crate) fn process_running_script(process: &str) -> String {
    format!(
        r#"tell application "System Events" to return (exists application process {})"#,
        quote(process)
    )
}

pub(crate) fn list_all_tabs_script(app: &str) -> String {
    format!(
        r#"tell application {}
    set out to ""
    set wi to 0
    repeat with w in windows
        set wi to wi + 1
        set ti to 0
        repeat with t in tabs of w
            set ti to ti + 1
            set out to out & wi & tab & ti & tab & (URL of t) & linefeed
        end repeat
    end repeat
    return out
end tell"#,
        quote(app)
    )
}

pub(crate) fn set_tab_url_script(app: &str, window: usize, tab: usize, url: &str) -> String {
    format!(
        r#"tell application {} to set URL of tab {} of window {} to {}"#,
        quote(app),
        tab,
        window,
        quote(url)
    )
}

pub(crate) fn active_tab_url_script(app: &str, active_tab_ref: &str) -> String {
    format!(
        r#"tell application {} to return URL of {} of front window"#,
        quote(app),
        active_tab_ref
    )
}

pub(crate) fn set_active_tab_url_script(app: &str, active_tab_ref: &str, url: &str) -> String {
    format!(
        r#"tell application {} to set URL of {} of front window to {}"#,
        quote(app),
        active_tab_ref,
        quote(url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_specials() {
        assert_eq!(quote("Slack"), "\"Slack\"");
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(quote("x\ny"), "\"x y\"");
    }

    #[test]
    fn parses_process_list() {
        let out = "Finder\tfalse\nSlack\ttrue\n\nGoogle Chrome\tfalse\n";
        let apps = parse_process_list(out);
        assert_eq!(
            apps,
            vec![
                RunningApp::new("Finder", false),
                RunningApp::new("Slack", true),
                RunningApp::new("Google Chrome", false),
            ]
        );
    }

    #[test]
    fn parses_tab_list() {
        let out = "1\t1\thttps://youtube.com/\n1\t2\tmissing value\n2\t1\thttps://docs.rs/\tx\nbad line\n";
        let tabs = parse_tab_list(out);
        assert_eq!(tabs.len(), 2);
        assert_eq!(
            tabs[0],
            TabRef {
                window: 1,
                tab: 1,
                url: "https://youtube.com/".into()
            }
        );
        assert_eq!(tabs[1].window, 2);
        assert_eq!(tabs[1].url, "https://docs.rs/\tx");
    }

    #[test]
    fn scripts_quote_user_values() {
        let script = set_visible_script(r#"Evil" to quit"#, false);
        assert!(script.contains(r#"application process "Evil\" to quit" to false"#));

        let script = set_tab_url_script("Safari", 2, 3, "about:blank");
        assert_eq!(
            script,
            r#"tell application "Safari" to set URL of tab 3 of window 2 to "about:blank""#
        );

        let script = active_tab_url_script("Arc", "active tab");
        assert_eq!(script, r#"tell application "Arc" to return URL of active tab of front window"#);
    }
}
