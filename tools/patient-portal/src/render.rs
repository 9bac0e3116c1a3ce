use crate::errors::PortalError;
use crate::runtime::Terminal;
use crate::screen::Screen;

pub const TITLE_RULE: char = '═';
pub const SECTION_RULE: char = '─';
pub const CONTINUE_PROMPT: &str = "continue";
pub const CONTINUE_TEXT: &str = "> Press enter to continue...";
pub const EMPTY_PROMPT_TEXT: &str = "...";

fn rule(ch: char, width_of: &str) -> String {
    ch.to_string().repeat(width_of.chars().count())
}

pub fn title_lines(title: Option<&str>) -> Vec<String> {
    match title {
        Some(title) if !title.is_empty() => vec![title.to_string(), rule(TITLE_RULE, title)],
        _ => Vec::new(),
    }
}

/// An empty header still occupies a line; only `None` is skipped.
pub fn header_lines(header: Option<&str>) -> Vec<String> {
    match header {
        None => Vec::new(),
        Some("") => vec![String::new()],
        Some(header) => vec![header.to_string(), rule(SECTION_RULE, header)],
    }
}

pub fn body_lines(body: Option<&str>) -> Vec<String> {
    match body {
        Some(body) if !body.is_empty() => vec![body.to_string()],
        _ => Vec::new(),
    }
}

pub fn prompt_lines(prompt: Option<&str>) -> Vec<String> {
    match prompt {
        None => Vec::new(),
        Some("") => vec![EMPTY_PROMPT_TEXT.to_string()],
        Some(CONTINUE_PROMPT) => vec![rule(SECTION_RULE, CONTINUE_TEXT), CONTINUE_TEXT.to_string()],
        Some(prompt) => {
            let text = format!("> {prompt}: ");
            vec![rule(SECTION_RULE, &text), text]
        }
    }
}

pub fn message_lines(message: Option<&str>) -> Vec<String> {
    match message {
        Some(message) if !message.is_empty() => vec![format!("[{message}]")],
        _ => Vec::new(),
    }
}

/// Lines emitted after the clear for a present screen.
pub fn screen_lines(screen: &Screen) -> Vec<String> {
    let mut lines = title_lines(screen.title.as_deref());
    if screen.in_message_mode() {
        lines.extend(message_lines(screen.message.as_deref()));
        lines.extend(prompt_lines(Some(CONTINUE_PROMPT)));
        return lines;
    }
    lines.extend(header_lines(screen.header.as_deref()));
    lines.extend(body_lines(screen.body.as_deref()));
    lines.extend(prompt_lines(screen.prompt.as_deref()));
    lines
}

/// An absent screen writes nothing at all, not even the clear.
pub fn render_screen(terminal: &dyn Terminal, screen: Option<&Screen>) -> Result<(), PortalError> {
    let Some(screen) = screen else {
        return Ok(());
    };
    terminal.clear()?;
    for line in screen_lines(screen) {
        terminal.write_line(&line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::FakeTerminal;

    #[test]
    fn title_rule_matches_title_width() {
        assert_eq!(
            title_lines(Some("Patient Health System")),
            vec!["Patient Health System", "═════════════════════"]
        );
        assert!(title_lines(Some("")).is_empty());
        assert!(title_lines(None).is_empty());
    }

    #[test]
    fn header_handles_empty_and_missing() {
        assert_eq!(
            header_lines(Some("Hello, Johnny Lawrence!")),
            vec!["Hello, Johnny Lawrence!", "───────────────────────"]
        );
        assert_eq!(header_lines(Some("")), vec![""]);
        assert!(header_lines(None).is_empty());
    }

    #[test]
    fn body_is_a_single_line_entry() {
        assert_eq!(
            body_lines(Some("1. Login (Existing user)\n2. Create account (New user)")),
            vec!["1. Login (Existing user)\n2. Create account (New user)"]
        );
        assert!(body_lines(Some("")).is_empty());
        assert!(body_lines(None).is_empty());
    }

    #[test]
    fn prompt_variants() {
        assert_eq!(
            prompt_lines(Some("Enter your choice (1-2)")),
            vec!["───────────────────────────", "> Enter your choice (1-2): "]
        );
        assert_eq!(
            prompt_lines(Some("continue")),
            vec!["────────────────────────────", "> Press enter to continue..."]
        );
        assert_eq!(prompt_lines(Some("")), vec!["..."]);
        assert!(prompt_lines(None).is_empty());
    }

    #[test]
    fn message_is_bracketed() {
        assert_eq!(message_lines(Some("Login successful!")), vec!["[Login successful!]"]);
        assert!(message_lines(Some("")).is_empty());
        assert!(message_lines(None).is_empty());
    }

    #[test]
    fn render_null_screen_writes_nothing() {
        let terminal = FakeTerminal::new(true);
        render_screen(&terminal, None).expect("render");
        assert!(terminal.events().is_empty());
    }

    #[test]
    fn render_empty_screen_only_clears() {
        let terminal = FakeTerminal::new(true);
        render_screen(&terminal, Some(&Screen::default())).expect("render");
        assert_eq!(terminal.clear_count(), 1);
        assert!(terminal.written_lines().is_empty());
    }
}
