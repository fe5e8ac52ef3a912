//! Command line grammar, autocomplete and interpretation.
//!
//! Everything typed into the command line is either move text (forwarded to the engine
//! untouched) or a slash command from [`COMMANDS`]. The predictor and the interpreter are
//! both driven by that one table, so adding a command means adding a template here and a
//! branch in [`interpret`].

use std::fmt;

/// Prefix that switches the command line into command mode
pub const COMMAND_PREFIX: char = '/';

/// Recognized command templates, in display order
pub const COMMANDS: &[&str] = &["/undo", "/perft <depth>"];

/// Shown by the predictor when no template matches
pub const NO_COMMANDS_FOUND: &str = "No commands found.";

/// Deepest perft the client will ever request
pub const MAX_PERFT_DEPTH: u32 = 4;

const WILDCARD: &str = "<>";

/// One token of a command template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateToken<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

impl<'a> TemplateToken<'a> {
    fn parse(token: &'a str) -> Self {
        match token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            Some(name) => TemplateToken::Placeholder(name),
            None => TemplateToken::Literal(token),
        }
    }
}

/// A parsed view of a grammar template such as `"/perft <depth>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate {
    pub pattern: &'static str,
}

impl CommandTemplate {
    /// The command name, e.g. `/perft`
    pub fn name(&self) -> &'static str {
        self.pattern.split_whitespace().next().unwrap_or(self.pattern)
    }

    pub fn tokens(&self) -> Vec<TemplateToken<'static>> {
        self.pattern.split_whitespace().map(TemplateToken::parse).collect()
    }

    /// Names of the argument slots, in order
    pub fn placeholders(&self) -> Vec<&'static str> {
        self.tokens()
            .into_iter()
            .filter_map(|t| match t {
                TemplateToken::Placeholder(name) => Some(name),
                TemplateToken::Literal(_) => None,
            })
            .collect()
    }
}

/// Iterate over the grammar
pub fn templates() -> impl Iterator<Item = CommandTemplate> {
    COMMANDS.iter().map(|&pattern| CommandTemplate { pattern })
}

/// Look up a template by its command name
pub fn find_template(name: &str) -> Option<CommandTemplate> {
    templates().find(|t| t.name() == name)
}

/// Replace every `<...>` span with a bare wildcard so typed placeholders compare equal
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(len) => {
                out.push_str(&rest[..start]);
                out.push_str(WILDCARD);
                rest = &rest[start + len + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Whether the typed tokens fill the template's argument slots
fn fills_slots(template: &CommandTemplate, input: &str) -> bool {
    let typed: Vec<&str> = input.split_whitespace().collect();
    let slots = template.tokens();
    if typed.len() < 2 || typed.len() > slots.len() || typed[0] != template.name() {
        return false;
    }
    let last = typed.len() - 1;
    typed.iter().zip(&slots).enumerate().skip(1).all(|(i, (word, slot))| match slot {
        TemplateToken::Placeholder(_) => true,
        TemplateToken::Literal(lit) if i == last => lit.starts_with(word),
        TemplateToken::Literal(lit) => lit == word,
    })
}

/// Autocomplete suggestions for the text typed so far.
///
/// Outside command mode this is always empty. In command mode it is never empty: a
/// single [`NO_COMMANDS_FOUND`] entry stands in when nothing matches.
pub fn predict(input: &str) -> Vec<String> {
    if !input.starts_with(COMMAND_PREFIX) {
        return Vec::new();
    }

    let typed = normalize(input);
    let mut predictions: Vec<String> = templates()
        .filter(|t| normalize(t.pattern).starts_with(&typed) || fills_slots(t, input))
        .map(|t| t.pattern.to_string())
        .collect();

    if predictions.is_empty() {
        predictions.push(NO_COMMANDS_FOUND.to_string());
    }
    predictions
}

/// A slash command split into its name and raw argument tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub raw_args: Vec<String>,
}

impl Command {
    /// Split command text on whitespace; `None` for text outside command mode
    pub fn parse(text: &str) -> Option<Self> {
        if !text.starts_with(COMMAND_PREFIX) {
            return None;
        }
        let mut tokens = text.split_whitespace();
        let name = tokens.next()?.to_string();
        let raw_args = tokens.map(str::to_string).collect();
        Some(Self { name, raw_args })
    }
}

/// Why the interpreter refused a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidDepth,
    DepthTooHigh { depth: u32, max: u32 },
    UnknownCommand(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidDepth => write!(f, "invalid depth"),
            RejectReason::DepthTooHigh { .. } => write!(f, "depth too high"),
            RejectReason::UnknownCommand(_) => write!(f, "unknown command"),
        }
    }
}

/// What a line of command text asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Free text handed to the engine's own move parser
    PlayMoveText(String),
    Undo,
    PerftTest(u32),
    Rejected(RejectReason),
}

/// Classify a submitted line. Performs no I/O.
pub fn interpret(text: &str) -> Action {
    let Some(command) = Command::parse(text.trim_end()) else {
        return Action::PlayMoveText(text.to_string());
    };

    // anything spelled like /perft runs perft; only the first argument counts
    if text.starts_with("/perft") {
        return perft_depth(text.split_whitespace().nth(1));
    }

    match find_template(&command.name) {
        Some(t) if t.name() == "/undo" && command.raw_args.len() == t.placeholders().len() => {
            Action::Undo
        }
        _ => Action::Rejected(RejectReason::UnknownCommand(command.name)),
    }
}

fn perft_depth(arg: Option<&str>) -> Action {
    let Some(depth) = arg.and_then(|d| d.parse::<u32>().ok()) else {
        return Action::Rejected(RejectReason::InvalidDepth);
    };
    if depth > MAX_PERFT_DEPTH {
        Action::Rejected(RejectReason::DepthTooHigh {
            depth,
            max: MAX_PERFT_DEPTH,
        })
    } else {
        Action::PerftTest(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parts() {
        let perft = find_template("/perft").unwrap();
        assert_eq!(perft.name(), "/perft");
        assert_eq!(perft.placeholders(), vec!["depth"]);
        assert_eq!(
            perft.tokens(),
            vec![TemplateToken::Literal("/perft"), TemplateToken::Placeholder("depth")]
        );
        assert!(find_template("/undo").unwrap().placeholders().is_empty());
        assert!(find_template("/reset").is_none());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/perft <depth>"), "/perft <>");
        assert_eq!(normalize("/perft <"), "/perft <");
        assert_eq!(normalize("/a <b> <c>"), "/a <> <>");
    }

    #[test]
    fn test_predict_prefix() {
        assert_eq!(predict("/per"), vec!["/perft <depth>"]);
        assert_eq!(predict("/"), vec!["/undo", "/perft <depth>"]);
        assert_eq!(predict("/perft "), vec!["/perft <depth>"]);
        assert_eq!(predict("/u"), vec!["/undo"]);
    }

    #[test]
    fn test_predict_with_argument() {
        assert_eq!(predict("/perft 3"), vec!["/perft <depth>"]);
        assert_eq!(predict("/perft <depth>"), vec!["/perft <depth>"]);
        assert_eq!(predict("/perft 3 4"), vec![NO_COMMANDS_FOUND]);
        assert_eq!(predict("/undo 3"), vec![NO_COMMANDS_FOUND]);
    }

    #[test]
    fn test_predict_outside_command_mode() {
        assert!(predict("hello").is_empty());
        assert!(predict("").is_empty());
        assert!(predict(" /undo").is_empty());
    }

    #[test]
    fn test_predict_nothing_found() {
        assert_eq!(predict("/zz"), vec![NO_COMMANDS_FOUND]);
    }

    #[test]
    fn test_command_parse() {
        let cmd = Command::parse("/perft   3").unwrap();
        assert_eq!(cmd.name, "/perft");
        assert_eq!(cmd.raw_args, vec!["3"]);
        assert!(Command::parse("e4").is_none());
    }

    #[test]
    fn test_interpret_moves() {
        assert_eq!(interpret("e4"), Action::PlayMoveText("e4".to_string()));
        assert_eq!(interpret("Nf3 "), Action::PlayMoveText("Nf3 ".to_string()));
    }

    #[test]
    fn test_interpret_undo() {
        assert_eq!(interpret("/undo"), Action::Undo);
        assert_eq!(interpret("/undo  "), Action::Undo);
        assert_eq!(
            interpret("/undo now"),
            Action::Rejected(RejectReason::UnknownCommand("/undo".to_string()))
        );
    }

    #[test]
    fn test_interpret_perft() {
        assert_eq!(interpret("/perft 3"), Action::PerftTest(3));
        assert_eq!(interpret("/perft 4"), Action::PerftTest(4));
        assert_eq!(
            interpret("/perft 5"),
            Action::Rejected(RejectReason::DepthTooHigh { depth: 5, max: 4 })
        );
        assert_eq!(interpret("/perft"), Action::Rejected(RejectReason::InvalidDepth));
        assert_eq!(interpret("/perft x"), Action::Rejected(RejectReason::InvalidDepth));
        assert_eq!(interpret("/perft -1"), Action::Rejected(RejectReason::InvalidDepth));
        // extra arguments are ignored and the name only has to start with /perft
        assert_eq!(interpret("/perft 3 4"), Action::PerftTest(3));
        assert_eq!(interpret("/perftx 3"), Action::PerftTest(3));
        assert_eq!(interpret("/perft 2   "), Action::PerftTest(2));
    }

    #[test]
    fn test_interpret_unknown() {
        assert_eq!(
            interpret("/reset"),
            Action::Rejected(RejectReason::UnknownCommand("/reset".to_string()))
        );
        assert_eq!(
            RejectReason::UnknownCommand("/x".into()).to_string(),
            "unknown command"
        );
        assert_eq!(
            RejectReason::DepthTooHigh { depth: 9, max: 4 }.to_string(),
            "depth too high"
        );
    }
}
