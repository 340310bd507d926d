use crate::tag::TagSet;

use winsys::Result;

use regex::Regex;

/// Seeds a new client's tags and floating flag when its identity
/// (`class:instance:name`) matches the pattern.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    tags: Option<Regex>,
    floating: bool,
}

impl Rule {
    pub fn new(
        pattern: &str,
        tags: Option<&str>,
        floating: bool,
    ) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            tags: match tags {
                Some(tags) => Some(Regex::new(tags)?),
                None => None,
            },
            floating,
        })
    }

    #[inline]
    pub fn matches(
        &self,
        identity: &str,
    ) -> bool {
        self.pattern.is_match(identity)
    }

    #[inline]
    pub fn floating(&self) -> bool {
        self.floating
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every matching rule in order. The last match decides the
    /// floating flag; tags accumulate across matches. Returns `None` when
    /// no rule matched.
    pub fn apply(
        &self,
        tag_set: &TagSet,
        identity: &str,
    ) -> Option<(Vec<bool>, bool)> {
        let mut tags = vec![false; tag_set.len()];
        let mut floating = None;

        for rule in self.rules.iter().filter(|rule| rule.matches(identity)) {
            debug!("rule {} matches {}", rule.pattern, identity);
            floating = Some(rule.floating);

            if let Some(pattern) = &rule.tags {
                for (tag, matched) in tags.iter_mut().zip(tag_set.matching_tags(pattern)) {
                    *tag |= matched;
                }
            }
        }

        floating.map(|floating| (tags, floating))
    }
}
