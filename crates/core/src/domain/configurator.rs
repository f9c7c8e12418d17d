use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "option#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguratorOption {
    pub id: OptionId,
    pub group_id: GroupId,
    pub name: String,
}

/// A configurator dimension such as color or size. Options keep the order in
/// which they were registered; variant generation relies on that order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguratorGroup {
    pub id: GroupId,
    pub name: String,
    pub options: Vec<ConfiguratorOption>,
}

impl ConfiguratorGroup {
    pub fn contains(&self, option_id: OptionId) -> bool {
        self.options.iter().any(|option| option.id == option_id)
    }

    pub fn option_named(&self, name: &str) -> Option<&ConfiguratorOption> {
        self.options.iter().find(|option| option.name == name)
    }
}

/// The catalog-wide set of groups. Products reference groups and options by
/// identity only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configurator {
    groups: Vec<ConfiguratorGroup>,
}

impl Configurator {
    pub fn new(groups: Vec<ConfiguratorGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[ConfiguratorGroup] {
        &self.groups
    }

    pub fn group(&self, group_id: GroupId) -> Option<&ConfiguratorGroup> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    pub fn group_named(&self, name: &str) -> Option<&ConfiguratorGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn option(&self, option_id: OptionId) -> Option<&ConfiguratorOption> {
        self.groups.iter().flat_map(|group| group.options.iter()).find(|option| option.id == option_id)
    }

    /// Resolves `group.option` names to the option identity.
    pub fn option_id(&self, group_name: &str, option_name: &str) -> Option<OptionId> {
        self.group_named(group_name)?.option_named(option_name).map(|option| option.id)
    }
}
