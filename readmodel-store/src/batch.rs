//! Queued mutations applied as one atomic group.

/// A single queued mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Overwrite a string value.
    Set { key: String, value: String },
    /// Remove a key of any kind.
    Del { key: String },
    /// Set one field of a hash.
    HSet { key: String, field: String, value: String },
    /// Add members to a set.
    SAdd { key: String, members: Vec<String> },
    /// Remove members from a set.
    SRem { key: String, members: Vec<String> },
}

impl Command {
    /// The key this command writes.
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. }
            | Self::Del { key }
            | Self::HSet { key, .. }
            | Self::SAdd { key, .. }
            | Self::SRem { key, .. } => key,
        }
    }
}

/// An ordered group of commands.
///
/// A store applies a batch all-or-nothing: readers observe either none of
/// its effects or all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Command::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn del(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Command::Del { key: key.into() })
    }

    pub fn hset(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push(Command::HSet {
            key: key.into(),
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn sadd(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.sadd_all(key, [member.into()])
    }

    pub fn sadd_all<I>(&mut self, key: impl Into<String>, members: I) -> &mut Self
    where
        I: IntoIterator<Item = String>,
    {
        self.push(Command::SAdd {
            key: key.into(),
            members: members.into_iter().collect(),
        })
    }

    pub fn srem(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.push(Command::SRem {
            key: key.into(),
            members: vec![member.into()],
        })
    }

    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl IntoIterator for Batch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}
