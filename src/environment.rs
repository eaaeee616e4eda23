use crate::error::Result;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "fold")]
    Fold, // constant folding only
    #[serde(rename = "propagate")]
    Propagate, // constant folding interleaved with constant propagation
}

impl Default for Mode {
    fn default() -> Self {
        Self::Propagate
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "fold"),
            Self::Propagate => write!(f, "propagate"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum FoldingRule {
    #[serde(rename = "block")]
    Block,
    #[serde(rename = "parenthesized")]
    Parenthesized,
    #[serde(rename = "negation")]
    Negation,
    #[serde(rename = "plus")]
    Plus,
    #[serde(rename = "less_than")]
    LessThan,
    #[serde(rename = "if_statement")]
    IfStatement,
}

impl FoldingRule {
    /// All rules in their default application order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Block,
            Self::Parenthesized,
            Self::Negation,
            Self::Plus,
            Self::LessThan,
            Self::IfStatement,
        ]
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Folding {
    #[serde(default = "FoldingRule::all")]
    pub rules: Vec<FoldingRule>,
}

impl Default for Folding {
    fn default() -> Self {
        Self {
            rules: FoldingRule::all(),
        }
    }
}

#[derive(Default, Builder, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[builder(default)]
pub struct Environment {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub folding: Folding,
    #[serde(default = "disabled")]
    pub debug: bool,
}

impl Environment {
    pub fn from_file(path: &Path) -> Result<Environment> {
        let file = File::open(path)
            .map_err(|_| format!("Environment file '{}' could not be loaded", path.display()))?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }
}

impl EnvironmentBuilder {
    /// Takes every setting from the environment file at `path`.
    pub fn from_file(&mut self, path: &Path) -> Result<&mut Self> {
        let env = Environment::from_file(path)?;
        Ok(self.mode(env.mode).folding(env.folding).debug(env.debug))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yaml = serde_yaml::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", yaml)
    }
}

fn disabled() -> bool {
    false
}
