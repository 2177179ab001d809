//! X11 window queries through `xdotool` and `xwininfo`
//!
//! Both tools print plain text; the parsers are kept separate from the
//! process calls so they can be tested without a display.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use super::GeometryStrategy;
use crate::desktop::types::{Point, Rect, WindowId};

/// Run a command and return its stdout, failing on a non-zero exit
fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| anyhow!("Failed to run {}: {}", program, e))?;

    if !output.status.success() {
        return Err(anyhow!(
            "{} {} exited with {}: {}",
            program,
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `KEY=VALUE` lines as printed by `xdotool ... --shell`
pub fn parse_shell_vars(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn shell_int<T: std::str::FromStr>(vars: &HashMap<String, String>, key: &str) -> Option<T> {
    vars.get(key).and_then(|v| v.parse().ok())
}

/// Geometry from `xdotool getwindowgeometry --shell`
pub fn parse_xdotool_geometry(output: &str) -> Option<Rect> {
    let vars = parse_shell_vars(output);
    Some(Rect::new(
        shell_int(&vars, "X")?,
        shell_int(&vars, "Y")?,
        shell_int(&vars, "WIDTH")?,
        shell_int(&vars, "HEIGHT")?,
    ))
}

/// Geometry from `xwininfo -id`
pub fn parse_xwininfo(output: &str) -> Option<Rect> {
    static FIELD: OnceLock<Regex> = OnceLock::new();
    let re = FIELD.get_or_init(|| {
        Regex::new(r"(?m)^\s*(Absolute upper-left X|Absolute upper-left Y|Width|Height):\s*(-?\d+)")
            .expect("valid xwininfo regex")
    });

    let fields: HashMap<&str, i64> = re
        .captures_iter(output)
        .filter_map(|c| {
            let key = c.get(1)?.as_str();
            let value = c.get(2)?.as_str().parse().ok()?;
            Some((key, value))
        })
        .collect();

    Some(Rect::new(
        i32::try_from(*fields.get("Absolute upper-left X")?).ok()?,
        i32::try_from(*fields.get("Absolute upper-left Y")?).ok()?,
        u32::try_from(*fields.get("Width")?).ok()?,
        u32::try_from(*fields.get("Height")?).ok()?,
    ))
}

/// Geometry strategy using `xdotool getwindowgeometry`
pub struct XdotoolGeometry {
    program: String,
}

impl XdotoolGeometry {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl GeometryStrategy for XdotoolGeometry {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    fn resolve(&self, window_id: WindowId) -> Result<Option<Rect>> {
        let id = window_id.to_string();
        let output = run_tool(&self.program, &["getwindowgeometry", "--shell", &id])?;
        Ok(parse_xdotool_geometry(&output))
    }
}

/// Geometry strategy using `xwininfo`, which reports frame-independent
/// absolute coordinates on some window managers where xdotool does not
#[derive(Default)]
pub struct XwininfoGeometry;

impl XwininfoGeometry {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryStrategy for XwininfoGeometry {
    fn name(&self) -> &'static str {
        "xwininfo"
    }

    fn resolve(&self, window_id: WindowId) -> Result<Option<Rect>> {
        let id = window_id.to_string();
        let output = run_tool("xwininfo", &["-id", &id])?;
        Ok(parse_xwininfo(&output))
    }
}

/// Raise and focus a window, waiting until the window manager confirms
pub fn activate_window(xdotool: &str, window_id: WindowId) -> Result<()> {
    let id = window_id.to_string();
    run_tool(xdotool, &["windowactivate", "--sync", &id]).map(|_| ())
}

/// Absolute pointer position
pub fn pointer_location(xdotool: &str) -> Result<Point> {
    let vars = parse_shell_vars(&run_tool(xdotool, &["getmouselocation", "--shell"])?);
    match (shell_int(&vars, "X"), shell_int(&vars, "Y")) {
        (Some(x), Some(y)) => Ok(Point::new(x, y)),
        _ => Err(anyhow!("xdotool did not report a pointer position")),
    }
}

/// Window currently under the pointer
pub fn window_under_pointer(xdotool: &str) -> Result<WindowId> {
    let vars = parse_shell_vars(&run_tool(xdotool, &["getmouselocation", "--shell"])?);
    shell_int(&vars, "WINDOW").ok_or_else(|| anyhow!("xdotool did not report a window under the pointer"))
}

/// Window ids whose title matches `name` (xdotool regex semantics)
pub fn search_by_name(xdotool: &str, name: &str) -> Result<Vec<WindowId>> {
    let output = run_tool(xdotool, &["search", "--name", name])?;
    Ok(output.lines().filter_map(|l| l.trim().parse().ok()).collect())
}

/// Window title as reported by xdotool
pub fn window_name(xdotool: &str, window_id: WindowId) -> Result<String> {
    let id = window_id.to_string();
    run_tool(xdotool, &["getwindowname", &id]).map(|s| s.trim().to_string())
}

/// Check that a tool is installed by running it with `--version`
pub fn tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xdotool_geometry() {
        let output = "WINDOW=62914567\nX=120\nY=85\nWIDTH=1024\nHEIGHT=768\nSCREEN=0\n";
        assert_eq!(parse_xdotool_geometry(output), Some(Rect::new(120, 85, 1024, 768)));
    }

    #[test]
    fn test_parse_xdotool_geometry_missing_field() {
        assert_eq!(parse_xdotool_geometry("X=1\nY=2\nWIDTH=3\n"), None);
    }

    #[test]
    fn test_parse_xwininfo() {
        let output = r#"
xwininfo: Window id: 0x3c00007 "Terminal"

  Absolute upper-left X:  1930
  Absolute upper-left Y:  64
  Relative upper-left X:  0
  Relative upper-left Y:  0
  Width: 1280
  Height: 720
  Depth: 24
"#;
        assert_eq!(parse_xwininfo(output), Some(Rect::new(1930, 64, 1280, 720)));
    }

    #[test]
    fn test_parse_mouse_location_window() {
        let vars = parse_shell_vars("X=640\nY=400\nSCREEN=0\nWINDOW=62914567\n");
        assert_eq!(shell_int::<WindowId>(&vars, "WINDOW"), Some(62914567));
        assert_eq!(shell_int::<i32>(&vars, "X"), Some(640));
    }
}
