// # Alias Pool
//
// The ordered universe of aliases generated from one seed address.
//
// ## Generation Order
//
// For a local part of N characters there are N-1 internal boundaries. The
// pool lists the unmodified address first, then every variant with one
// separator, then two, up to N-1. Inside each group, boundary sets follow
// lexicographic increasing-index order:
//
// ```text
// abc@gmail.com
// a.bc@gmail.com
// ab.c@gmail.com
// a.b.c@gmail.com
// ```
//
// Allocation walks the pool front to back, so this order is the preference
// order for handing out aliases.

use itertools::Itertools;
use std::collections::HashSet;

use crate::alias::{Alias, SEPARATOR, SeedAddress};
use crate::config::AddressPolicy;
use crate::error::Result;

/// Ordered sequence of generated aliases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasPool {
    aliases: Vec<Alias>,
}

impl AliasPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the full pool for a raw seed address
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidAddress`] if the seed does not satisfy `policy`.
    pub fn generate(seed: &str, policy: &AddressPolicy) -> Result<Self> {
        let seed = SeedAddress::parse(seed, policy)?;
        Ok(Self::from_seed(&seed))
    }

    /// Generate the full pool for a validated seed
    pub fn from_seed(seed: &SeedAddress) -> Self {
        let chars: Vec<char> = seed.local_part().chars().collect();
        let boundaries = chars.len().saturating_sub(1);

        let mut aliases = Vec::with_capacity(1usize << boundaries);
        aliases.push(seed.to_alias());

        for dots in 1..=boundaries {
            for combo in (0..boundaries).combinations(dots) {
                aliases.push(dotted(&chars, &combo, seed.domain()));
            }
        }

        Self { aliases }
    }

    /// Rebuild a pool from persisted lines
    ///
    /// Lines are trimmed; blank lines are skipped.
    pub fn from_lines(content: &str) -> Self {
        let aliases = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Alias::from)
            .collect();
        Self { aliases }
    }

    /// Serialize to the newline-delimited pool format
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for alias in &self.aliases {
            out.push_str(alias.as_str());
            out.push('\n');
        }
        out
    }

    /// Pool members not in `used`, in generation order
    pub fn all_unused(&self, used: &HashSet<Alias>) -> Vec<Alias> {
        self.aliases
            .iter()
            .filter(|alias| !used.contains(*alias))
            .cloned()
            .collect()
    }

    /// First pool member not in `used`
    pub fn first_unused(&self, used: &HashSet<&Alias>) -> Option<&Alias> {
        self.aliases.iter().find(|alias| !used.contains(alias))
    }

    /// Whether the alias belongs to this pool
    pub fn contains(&self, alias: &Alias) -> bool {
        self.aliases.contains(alias)
    }

    /// Iterate in generation order
    pub fn iter(&self) -> std::slice::Iter<'_, Alias> {
        self.aliases.iter()
    }

    /// Number of aliases
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// The aliases as a slice
    pub fn as_slice(&self) -> &[Alias] {
        &self.aliases
    }
}

impl<'a> IntoIterator for &'a AliasPool {
    type Item = &'a Alias;
    type IntoIter = std::slice::Iter<'a, Alias>;

    fn into_iter(self) -> Self::IntoIter {
        self.aliases.iter()
    }
}

impl FromIterator<Alias> for AliasPool {
    fn from_iter<I: IntoIterator<Item = Alias>>(iter: I) -> Self {
        Self {
            aliases: iter.into_iter().collect(),
        }
    }
}

/// Insert a separator before each character whose index is `boundary + 1`
fn dotted(chars: &[char], combo: &[usize], domain: &str) -> Alias {
    let mut address = String::with_capacity(chars.len() + combo.len() + domain.len() + 1);
    let mut next = combo.iter().peekable();

    for (i, c) in chars.iter().enumerate() {
        if next.peek().is_some_and(|&&b| b + 1 == i) {
            address.push(SEPARATOR);
            next.next();
        }
        address.push(*c);
    }

    address.push('@');
    address.push_str(domain);
    Alias::new(address)
}
