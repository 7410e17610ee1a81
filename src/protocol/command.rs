#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    ConfigGet,
    ConfigSet,
    ExtractToken,
    Translate,
    EditorEvent,
    EditorPoll,
    SessionState,
    CacheClear,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "config.get" => Command::ConfigGet,
            "config.set" => Command::ConfigSet,
            "extract_token" => Command::ExtractToken,
            "translate" => Command::Translate,
            "editor.event" => Command::EditorEvent,
            "editor.poll" => Command::EditorPoll,
            "session.state" => Command::SessionState,
            "cache.clear" => Command::CacheClear,
            _ => Command::Unknown,
        }
    }
}
