/// Static texts the bot itself sends. Concrete bots extend this with their own templates.
pub trait Resources: Send + Sync {
    /// Announcement sent once the bot has joined.
    fn started(&self) -> String {
        "Hello!".to_string()
    }

    /// Announcement sent before the bot leaves.
    fn stopped(&self) -> String {
        "Bye!".to_string()
    }

    /// Answer to the built-in `!info` command.
    fn info(&self) -> String {
        "No information available. Sorry!".to_string()
    }

    /// Answer to the built-in `!help` command.
    fn help(&self) -> String {
        "No help available. Sorry!".to_string()
    }
}

/// Resources with every default text.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResources;

impl Resources for DefaultResources {}
