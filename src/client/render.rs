//! What the voter and admin screens show.
//!
//! Each view renders two ways: an HTML fragment for embedding in the pages
//! the server ships, and plain text for the terminal.

use std::fmt::{self, Display, Write};

use crate::client::contract::Party;
use crate::models::VoterDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Failure,
}

impl Tone {
    fn class(self) -> &'static str {
        match self {
            Tone::Success => "success",
            Tone::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub tone: Tone,
    pub message: String,
}

impl Banner {
    pub fn success(message: &str) -> Self {
        Self {
            tone: Tone::Success,
            message: message.to_owned(),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            tone: Tone::Failure,
            message: message.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// A status banner with the voter's details when known.
    VoterInfo {
        banner: Banner,
        details: Option<VoterDetails>,
    },
    /// Logged in and still able to vote.
    Ballot {
        details: VoterDetails,
        parties: Vec<Party>,
    },
    /// Logged in after voting.
    Voted {
        details: VoterDetails,
        party_name: String,
    },
}

impl View {
    pub fn info(banner: Banner, details: Option<VoterDetails>) -> Self {
        View::VoterInfo { banner, details }
    }

    pub fn banner(&self) -> Banner {
        match self {
            View::VoterInfo { banner, .. } => banner.clone(),
            View::Ballot { .. } => Banner::success("Logged In"),
            View::Voted { .. } => Banner::success("Vote successful!"),
        }
    }

    pub fn to_html(&self) -> String {
        let banner = self.banner();
        let mut html = format!(
            "<div class=\"voter-info {}\">\n<h3>{}</h3>\n",
            banner.tone.class(),
            escape(&banner.message)
        );

        let details = match self {
            View::VoterInfo { details, .. } => details.as_ref(),
            View::Ballot { details, .. } | View::Voted { details, .. } => Some(details),
        };
        if let Some(details) = details {
            for (label, value) in detail_lines(details) {
                let _ = writeln!(html, "<p>{}: {}</p>", label, escape(&value));
            }
        }

        match self {
            View::Ballot { parties, .. } => {
                html.push_str("<select id=\"Party-select\">\n");
                for party in parties {
                    let _ = writeln!(
                        html,
                        "<option value=\"{}\">{}</option>",
                        party.number,
                        escape(&party.name)
                    );
                }
                html.push_str("</select>\n");
            }
            View::Voted { party_name, .. } => {
                let _ = writeln!(html, "<p>You voted for {}</p>", escape(party_name));
            }
            View::VoterInfo { .. } => {}
        }

        html.push_str("</div>\n");
        html
    }
}

impl Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.banner().message)?;

        match self {
            View::VoterInfo { details: Some(details), .. }
            | View::Ballot { details, .. }
            | View::Voted { details, .. } => {
                for (label, value) in detail_lines(details) {
                    writeln!(f, "  {label}: {value}")?;
                }
            }
            View::VoterInfo { details: None, .. } => {}
        }

        match self {
            View::Ballot { parties, .. } => {
                writeln!(f, "Parties:")?;
                for party in parties {
                    writeln!(f, "  [{}] {}", party.number, party.name)?;
                }
            }
            View::Voted { party_name, .. } => writeln!(f, "You voted for {party_name}")?,
            View::VoterInfo { .. } => {}
        }

        Ok(())
    }
}

fn detail_lines(details: &VoterDetails) -> [(&'static str, String); 5] {
    [
        ("Name", details.name.clone()),
        ("Age", details.age.to_string()),
        ("Gender", details.gender.clone()),
        ("Constituency Name", details.constituency_name.clone()),
        ("Constituency", details.constituency.to_string()),
    ]
}

/// A two-column results table.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub key_heading: &'static str,
    pub rows: Vec<(String, String)>,
}

impl Tally {
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<table>\n<thead><tr><th>{}</th><th>Votes</th></tr></thead>\n<tbody>\n",
            self.key_heading
        );
        for (key, votes) in &self.rows {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape(key),
                escape(votes)
            );
        }
        html.push_str("</tbody>\n</table>\n");
        html
    }
}

impl Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|(key, _)| key.chars().count())
            .chain([self.key_heading.chars().count()])
            .max()
            .unwrap_or(0);

        writeln!(f, "{:<width$}  Votes", self.key_heading)?;
        for (key, votes) in &self.rows {
            writeln!(f, "{key:<width$}  {votes}")?;
        }
        Ok(())
    }
}

/// Overall results, one card per party.
pub fn party_cards_html(parties: &[Party]) -> String {
    let mut html = String::from("<div id=\"party-result-cards\">\n");
    for party in parties {
        let _ = writeln!(
            html,
            "<div class=\"card\" data-party-number=\"{}\"><h3>{}</h3><p>Votes: {}</p></div>",
            party.number,
            escape(&party.name),
            party.vote_count
        );
    }
    html.push_str("</div>\n");
    html
}

pub fn escape(text: &str) -> String {
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
