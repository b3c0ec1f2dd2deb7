//! Help content model and HTML rendering
//!
//! Enumeration order is category insertion order, then command registration
//! order within the category, then option declaration order.

use crate::command::command::{Command, CommandTable, UNLISTED_CATEGORY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpOption {
    pub flags: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpCommand {
    /// Name plus positional placeholders
    pub signature: String,
    pub description: String,
    pub options: Vec<HelpOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpCategory {
    pub name: String,
    pub commands: Vec<HelpCommand>,
}

/// Ordered category -> command names index
#[derive(Debug, Clone, Default)]
pub(crate) struct CategoryIndex {
    buckets: Vec<(String, Vec<String>)>,
}

impl CategoryIndex {
    pub(crate) fn insert(&mut self, category: &str, name: &str) {
        match self.buckets.iter_mut().find(|(bucket, _)| bucket == category) {
            Some((_, members)) => members.push(name.to_string()),
            None => self
                .buckets
                .push((category.to_string(), vec![name.to_string()])),
        }
    }

    /// Remove `name` from `category`, dropping the bucket once it is empty
    pub(crate) fn remove(&mut self, category: &str, name: &str) {
        let Some(position) = self.buckets.iter().position(|(bucket, _)| bucket == category) else {
            return;
        };
        let members = &mut self.buckets[position].1;
        members.retain(|member| member != name);
        if members.is_empty() {
            self.buckets.remove(position);
            log::debug!("Removed empty category '{}'", category);
        }
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.buckets.iter().map(|(name, _)| name.clone()).collect()
    }

    pub(crate) fn members(&self, category: &str) -> Option<&[String]> {
        self.buckets
            .iter()
            .find(|(bucket, _)| bucket == category)
            .map(|(_, members)| members.as_slice())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets
            .iter()
            .map(|(name, members)| (name.as_str(), members.as_slice()))
    }
}

fn help_command(command: &Command) -> HelpCommand {
    HelpCommand {
        signature: command.signature(),
        description: command.description().to_string(),
        options: command
            .options()
            .iter()
            .map(|option| HelpOption {
                flags: option.flags().to_string(),
                description: option.description().to_string(),
            })
            .collect(),
    }
}

/// Build the help model, skipping the unlisted category
pub(crate) fn build_sections(categories: &CategoryIndex, commands: &CommandTable) -> Vec<HelpCategory> {
    categories
        .iter()
        .filter(|(name, _)| *name != UNLISTED_CATEGORY)
        .map(|(name, members)| HelpCategory {
            name: name.to_string(),
            commands: members
                .iter()
                .filter_map(|member| commands.get(member))
                .map(help_command)
                .collect(),
        })
        .collect()
}

/// Render the help model as an HTML fragment with all text escaped
pub fn render_html(sections: &[HelpCategory]) -> String {
    let mut html = String::from("<div class=\"help\">");
    for category in sections {
        html.push_str("<div class=\"help-category\">");
        html.push_str(&format!("<h3>{}</h3><ul>", escape_html(&category.name)));
        for command in &category.commands {
            html.push_str(&format!(
                "<li><code>{}</code> - {}",
                escape_html(&command.signature),
                escape_html(&command.description)
            ));
            if !command.options.is_empty() {
                html.push_str("<ul class=\"help-options\">");
                for option in &command.options {
                    html.push_str(&format!(
                        "<li><code>{}</code> {}</li>",
                        escape_html(&option.flags),
                        escape_html(&option.description)
                    ));
                }
                html.push_str("</ul>");
            }
            html.push_str("</li>");
        }
        html.push_str("</ul></div>");
    }
    html.push_str("</div>");
    html
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
