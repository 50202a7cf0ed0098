//! Robots.txt parser implementation
//!
//! Allow/Disallow evaluation is delegated to the robotstxt crate; Crawl-delay,
//! which that crate does not expose, is read with a small group-aware scan.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// Thin wrapper around the raw policy text. An empty policy, or one created
/// with [`ParsedRobots::allow_all`], permits everything.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is what the gate falls back to when robots.txt cannot be retrieved.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given product token
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `product_token` - The crawler's product token (e.g. "PageHarvest")
    pub fn is_allowed(&self, url: &str, product_token: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token, url)
    }

    /// Gets the crawl delay (seconds) that applies to the product token
    ///
    /// A group naming the token outranks the `*` group. Groups are runs of
    /// consecutive `User-agent` lines followed by their rules.
    pub fn crawl_delay(&self, product_token: &str) -> Option<f64> {
        if self.allow_all {
            return None;
        }

        let token = product_token.to_lowercase();
        let mut group_agents: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut wildcard_delay = None;
        let mut agent_delay = None;

        for line in self.content.lines() {
            // Strip comments
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if in_rules {
                        group_agents.clear();
                        in_rules = false;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group_agents
                        .iter()
                        .any(|agent| agent != "*" && !agent.is_empty() && token.contains(agent.as_str()))
                    {
                        agent_delay = Some(delay);
                    } else if group_agents.iter().any(|agent| agent == "*") {
                        wildcard_delay = Some(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        agent_delay.or(wildcard_delay)
    }
}
