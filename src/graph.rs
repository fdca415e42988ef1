//! Node/edge description of the mutual-guild graph.  Layout and physics are
//! the renderer's problem; this module only decides what exists, how big
//! guild nodes are, and which color each guild gets.

use crate::config::GraphSettings;
use crate::mutual::MutualGuildMap;
use crate::roster::GuildRoster;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

const HEX_DIGITS: &[u8] = b"0123456789ABCDEF";

#[derive(Debug, Clone, serde::Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub title: String,
    pub shape: &'static str,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Guild name for guild nodes; lets the dashboard filter client-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub color: String,
    pub guild: String,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GraphSpec {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// One node per mutual member, one node per displayed guild, one edge per
/// (member, displayed guild) pair.  Guilds outside `guilds_to_display` get
/// neither nodes nor edges, but their members still appear.
pub fn build(
    mutual: &MutualGuildMap,
    roster: &GuildRoster,
    guilds_to_display: &BTreeSet<String>,
    settings: &GraphSettings,
    rng: &mut impl Rng,
) -> GraphSpec {
    let colors = assign_colors(mutual, rng);
    let mut spec = GraphSpec::default();

    for (guild, color) in &colors {
        if !guilds_to_display.contains(guild) {
            continue;
        }
        let member_count = roster
            .membership
            .get(guild)
            .map(|members| members.len())
            .unwrap_or(0);
        spec.nodes.push(Node {
            id: format!("guild:{}", guild),
            label: guild.clone(),
            title: guild.clone(),
            shape: "circularImage",
            color: color.clone(),
            size: Some(guild_node_size(member_count, settings)),
            image: roster.guild_icons.get(guild).cloned().flatten(),
            guild: Some(guild.clone()),
        });
    }

    for (member, guilds) in mutual {
        spec.nodes.push(Node {
            id: format!("member:{}", member),
            label: member.to_string(),
            title: member.to_string(),
            shape: "circularImage",
            color: "blue".to_string(),
            size: None,
            image: roster.avatars.get(member).cloned().flatten(),
            guild: None,
        });

        for guild in guilds {
            if !guilds_to_display.contains(guild) {
                continue;
            }
            spec.edges.push(Edge {
                from: format!("member:{}", member),
                to: format!("guild:{}", guild),
                color: colors[guild].clone(),
                guild: guild.clone(),
            });
        }
    }

    spec
}

/// Sub-linear size so growth flattens for large guilds.
fn guild_node_size(member_count: usize, settings: &GraphSettings) -> f64 {
    settings.size_base * (member_count as f64).powf(settings.size_exponent)
}

/// One color per guild appearing in any mutual set, reused by that guild's
/// edges.  Random hex values; collisions are unlikely enough for a legend.
fn assign_colors(
    mutual: &MutualGuildMap,
    rng: &mut impl Rng,
) -> BTreeMap<String, String> {
    mutual
        .values()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|guild| (guild.clone(), random_color(rng)))
        .collect()
}

fn random_color(rng: &mut impl Rng) -> String {
    let digits: String = (0..6)
        .map(|_| HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char)
        .collect();
    format!("#{}", digits)
}
