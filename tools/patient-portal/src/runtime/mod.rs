use crate::errors::PortalError;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, PortalError>;
    fn write_string(&self, path: &Path, contents: &str) -> Result<(), PortalError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), PortalError>;
    fn remove_file(&self, path: &Path) -> Result<(), PortalError>;
    fn exists(&self, path: &Path) -> bool;
}

/// Line-oriented terminal. `read_line` is the only call that blocks; it
/// yields `None` once input is exhausted.
pub trait Terminal: Send + Sync {
    fn stdin_is_tty(&self) -> bool;
    fn clear(&self) -> Result<(), PortalError>;
    fn write_line(&self, line: &str) -> Result<(), PortalError>;
    fn read_line(&self) -> Result<Option<String>, PortalError>;
}

pub trait NumberSource: Send + Sync {
    /// Uniform draw from the inclusive range `low..=high`.
    fn next_in_range(&self, low: u32, high: u32) -> u32;
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortalError> {
        std::fs::read_to_string(path).map_err(|e| PortalError::Io(e.to_string()))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), PortalError> {
        std::fs::write(path, contents).map_err(|e| PortalError::Io(e.to_string()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), PortalError> {
        std::fs::create_dir_all(path).map_err(|e| PortalError::Io(e.to_string()))
    }

    fn remove_file(&self, path: &Path) -> Result<(), PortalError> {
        std::fs::remove_file(path).map_err(|e| PortalError::Io(e.to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn stdin_is_tty(&self) -> bool {
        std::io::IsTerminal::is_terminal(&std::io::stdin())
    }

    fn clear(&self) -> Result<(), PortalError> {
        use crossterm::cursor::MoveTo;
        use crossterm::execute;
        use crossterm::terminal::{Clear, ClearType};

        let mut out = std::io::stdout();
        execute!(out, Clear(ClearType::All), MoveTo(0, 0))
            .map_err(|e| PortalError::Terminal(e.to_string()))
    }

    fn write_line(&self, line: &str) -> Result<(), PortalError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| PortalError::Io(e.to_string()))
    }

    fn read_line(&self) -> Result<Option<String>, PortalError> {
        use std::io::{BufRead, Write};
        std::io::stdout()
            .flush()
            .map_err(|e| PortalError::Io(e.to_string()))?;
        let mut buf = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut buf)
            .map_err(|e| PortalError::Terminal(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = buf.trim_end_matches(['\r', '\n']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }
}

pub struct ProductionNumberSource;

impl NumberSource for ProductionNumberSource {
    fn next_in_range(&self, low: u32, high: u32) -> u32 {
        use rand::Rng;
        rand::thread_rng().gen_range(low..=high)
    }
}

pub struct ProductionRuntime {
    pub file_system: Arc<dyn FileSystem>,
    pub terminal: Arc<dyn Terminal>,
    pub numbers: Arc<dyn NumberSource>,
}

impl ProductionRuntime {
    pub fn new() -> Self {
        Self {
            file_system: Arc::new(ProductionFileSystem),
            terminal: Arc::new(ProductionTerminal),
            numbers: Arc::new(ProductionNumberSource),
        }
    }
}

impl Default for ProductionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    dirs: Arc<Mutex<Vec<PathBuf>>>,
    fail_next: Arc<Mutex<Option<PortalError>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let fs = Self::default();
        fs.files
            .lock()
            .expect("files lock")
            .insert(path.into(), contents.into());
        fs
    }

    pub fn set_fail_next(&self, error: PortalError) {
        *self.fail_next.lock().expect("fail lock") = Some(error);
    }

    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().expect("dirs lock").clone()
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.lock().expect("files lock").get(path).cloned()
    }

    fn maybe_fail(&self) -> Result<(), PortalError> {
        if let Some(err) = self.fail_next.lock().expect("fail lock").take() {
            return Err(err);
        }
        Ok(())
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortalError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .get(path)
            .cloned()
            .ok_or_else(|| PortalError::Io(format!("missing file {}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), PortalError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), PortalError> {
        self.maybe_fail()?;
        self.dirs
            .lock()
            .expect("dirs lock")
            .push(path.to_path_buf());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), PortalError> {
        self.maybe_fail()?;
        self.files.lock().expect("files lock").remove(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().expect("files lock").contains_key(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Clear,
    Line(String),
    Read(String),
}

/// Scripted terminal: queued input lines are handed out one per
/// `read_line`, after which input reports as closed.
#[derive(Default, Clone)]
pub struct FakeTerminal {
    pub is_tty: bool,
    inputs: Arc<Mutex<VecDeque<String>>>,
    events: Arc<Mutex<Vec<TerminalEvent>>>,
}

impl FakeTerminal {
    pub fn new(is_tty: bool) -> Self {
        Self {
            is_tty,
            ..Self::default()
        }
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terminal = Self::new(true);
        terminal.push_input(lines);
        terminal
    }

    pub fn push_input<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs
            .lock()
            .expect("inputs lock")
            .extend(lines.into_iter().map(Into::into));
    }

    pub fn pending_input(&self) -> usize {
        self.inputs.lock().expect("inputs lock").len()
    }

    pub fn events(&self) -> Vec<TerminalEvent> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn written_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TerminalEvent::Line(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, TerminalEvent::Clear))
            .count()
    }

    /// Lines written after each clear, one entry per rendered screen.
    pub fn frames(&self) -> Vec<Vec<String>> {
        let mut frames = Vec::new();
        for event in self.events() {
            match event {
                TerminalEvent::Clear => frames.push(Vec::new()),
                TerminalEvent::Line(line) => {
                    if let Some(frame) = frames.last_mut() {
                        frame.push(line);
                    }
                }
                TerminalEvent::Read(_) => {}
            }
        }
        frames
    }
}

impl Terminal for FakeTerminal {
    fn stdin_is_tty(&self) -> bool {
        self.is_tty
    }

    fn clear(&self) -> Result<(), PortalError> {
        self.events
            .lock()
            .expect("events lock")
            .push(TerminalEvent::Clear);
        Ok(())
    }

    fn write_line(&self, line: &str) -> Result<(), PortalError> {
        self.events
            .lock()
            .expect("events lock")
            .push(TerminalEvent::Line(line.to_string()));
        Ok(())
    }

    fn read_line(&self) -> Result<Option<String>, PortalError> {
        let next = self.inputs.lock().expect("inputs lock").pop_front();
        if let Some(line) = &next {
            self.events
                .lock()
                .expect("events lock")
                .push(TerminalEvent::Read(line.clone()));
        }
        Ok(next)
    }
}

/// Replays queued numbers; once drained it returns the low bound.
#[derive(Default, Clone)]
pub struct FakeNumberSource {
    queued: Arc<Mutex<VecDeque<u32>>>,
    draws: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl FakeNumberSource {
    pub fn with_values(values: impl IntoIterator<Item = u32>) -> Self {
        let source = Self::default();
        source
            .queued
            .lock()
            .expect("queue lock")
            .extend(values);
        source
    }

    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.draws.lock().expect("draws lock").clone()
    }
}

impl NumberSource for FakeNumberSource {
    fn next_in_range(&self, low: u32, high: u32) -> u32 {
        self.draws.lock().expect("draws lock").push((low, high));
        self.queued
            .lock()
            .expect("queue lock")
            .pop_front()
            .map(|value| value.clamp(low, high))
            .unwrap_or(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_terminal_splits_frames_on_clear() {
        let terminal = FakeTerminal::with_input(["1"]);
        terminal.write_line("before").expect("write");
        terminal.clear().expect("clear");
        terminal.write_line("a").expect("write");
        terminal.clear().expect("clear");
        terminal.write_line("b").expect("write");

        assert_eq!(terminal.frames(), vec![vec!["a".to_string()], vec!["b".to_string()]]);
        assert_eq!(terminal.read_line().expect("read"), Some("1".to_string()));
        assert_eq!(terminal.read_line().expect("read"), None);
    }

    #[test]
    fn fake_numbers_clamp_and_fall_back_to_low_bound() {
        let numbers = FakeNumberSource::with_values([5, 500]);
        assert_eq!(numbers.next_in_range(10, 99), 10);
        assert_eq!(numbers.next_in_range(10, 99), 99);
        assert_eq!(numbers.next_in_range(10, 99), 10);
        assert_eq!(numbers.draws().len(), 3);
    }

    #[test]
    fn fake_file_system_fails_once_when_armed() {
        let fs = FakeFileSystem::with_file("/a.json", "[]");
        fs.set_fail_next(PortalError::Io("disk gone".to_string()));
        assert!(fs.read_to_string(Path::new("/a.json")).is_err());
        assert_eq!(
            fs.read_to_string(Path::new("/a.json")).expect("second read"),
            "[]"
        );
    }
}
