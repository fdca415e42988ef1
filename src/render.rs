//! Renders the dashboard: one self-contained HTML page with the run log,
//! the summary table, a per-guild multi-select and the interactive graph.
//! Graph layout itself is vis-network's job; we only embed the description.

use crate::config::Config;
use crate::graph::GraphSpec;
use crate::logging::RunLog;
use crate::table::SummaryTable;
use anyhow::{Context as _, Result};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

const VIS_NETWORK_CDN: &str =
    "https://unpkg.com/vis-network/standalone/umd/vis-network.min.js";

/// Write the dashboard to the configured output path, replacing whatever a
/// previous run left there.
pub async fn write_dashboard(
    cfg: &Config,
    log: &RunLog,
    table: &SummaryTable,
    spec: &GraphSpec,
    guild_choices: &BTreeSet<String>,
) -> Result<PathBuf> {
    let page = render_page(cfg, log, table, spec, guild_choices)?;
    let path = cfg.general.output_path.clone();
    tokio::fs::write(&path, page).await.with_context(|| {
        format!("Could not write dashboard to `{}`", path.to_string_lossy())
    })?;
    Ok(path)
}

fn render_page(
    cfg: &Config,
    log: &RunLog,
    table: &SummaryTable,
    spec: &GraphSpec,
    guild_choices: &BTreeSet<String>,
) -> Result<String> {
    // Valid JSON either way; the escape keeps `</script>` out of the page.
    let graph_json = serde_json::to_string(spec)?.replace('<', "\\u003c");

    let mut page = String::new();
    let w = &mut page;

    write!(
        w,
        "<!DOCTYPE html>\n\
         <html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Mutual Guilds</title>\n\
         <script src=\"{}\"></script>\n",
        VIS_NETWORK_CDN
    )?;
    write!(
        w,
        "<style>\n\
         body {{ font-family: Arial, sans-serif; margin: 1.5em; }}\n\
         #graph {{ height: 750px; width: 100%; background: {}; }}\n\
         table {{ border-collapse: collapse; }}\n\
         td, th {{ border: 1px solid #ccc; padding: 0.3em 0.7em; }}\n\
         .log {{ font-size: small; color: #555; }}\n\
         </style>\n</head>\n<body>\n<h1>Mutual Guilds</h1>\n",
        escape_html(&cfg.graph.background)
    )?;

    w.push_str("<section class=\"log\">\n");
    for line in log.lines() {
        write!(w, "<div>{}</div>\n", escape_html(line))?;
    }
    w.push_str("</section>\n");

    render_table(w, table)?;
    render_guild_choices(w, guild_choices)?;

    w.push_str("<div id=\"graph\"></div>\n");
    write!(
        w,
        "<script>\n\
         const graph = {};\n\
         const container = document.getElementById('graph');\n\
         const network = new vis.Network(container, {{}}, {{\n\
           nodes: {{ font: {{ color: '{}', face: 'Arial' }} }},\n\
           physics: {{ solver: 'barnesHut' }},\n\
         }});\n\
         function selectedGuilds() {{\n\
           const boxes = document.querySelectorAll('.guild-toggle:checked');\n\
           return new Set(Array.from(boxes).map(b => b.value));\n\
         }}\n\
         function draw() {{\n\
           const show = selectedGuilds();\n\
           const nodes = graph.nodes.filter(n => !n.guild || show.has(n.guild));\n\
           const edges = graph.edges.filter(e => show.has(e.guild));\n\
           network.setData({{ nodes: new vis.DataSet(nodes),\n\
                              edges: new vis.DataSet(edges) }});\n\
         }}\n\
         document.querySelectorAll('.guild-toggle')\n\
           .forEach(b => b.addEventListener('change', draw));\n\
         draw();\n\
         </script>\n</body>\n</html>\n",
        graph_json,
        escape_html(&cfg.graph.font_color)
    )?;

    Ok(page)
}

fn render_table(w: &mut String, table: &SummaryTable) -> Result<()> {
    w.push_str("<h2>Shared guilds</h2>\n<table>\n<tr><th>member</th>");
    for column in &table.columns {
        write!(w, "<th>{}</th>", escape_html(column))?;
    }
    w.push_str("<th>num_mutual_guilds</th></tr>\n");

    for row in &table.rows {
        write!(w, "<tr><td>{}</td>", escape_html(row.member.as_str()))?;
        for flag in &row.flags {
            w.push_str(if *flag { "<td>&#9679;</td>" } else { "<td></td>" });
        }
        write!(w, "<td>{}</td></tr>\n", row.num_mutual_guilds)?;
    }
    w.push_str("</table>\n");
    Ok(())
}

/// All guilds start selected, matching the default view of everything.
fn render_guild_choices(w: &mut String, guilds: &BTreeSet<String>) -> Result<()> {
    w.push_str("<h2>Select guilds to show</h2>\n<form>\n");
    for guild in guilds {
        write!(
            w,
            "<label><input type=\"checkbox\" class=\"guild-toggle\" \
             value=\"{}\" checked> {}</label><br>\n",
            escape_html(guild),
            escape_html(guild)
        )?;
    }
    w.push_str("</form>\n");
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};
    use crate::mutual::MutualGuildMap;
    use crate::roster::MemberTag;
    use pretty_assertions::assert_eq;
    use std::num::NonZeroU16;

    fn fixture_page() -> String {
        let cfg = Config::default();

        let mut log = RunLog::new();
        log.note("Successfully processed guild [A]");
        log.note("Access denied to guild: [Z]");

        let mutual: MutualGuildMap = [(
            MemberTag::new("alice", NonZeroU16::new(1)),
            ["A".to_string(), "B".to_string()].into(),
        )]
        .into();
        let table = crate::table::format(&mutual);

        let spec = GraphSpec {
            nodes: vec![Node {
                id: "guild:A".to_string(),
                label: "A".to_string(),
                title: "A".to_string(),
                shape: "circularImage",
                color: "#AABBCC".to_string(),
                size: Some(120.0),
                image: None,
                guild: Some("A".to_string()),
            }],
            edges: vec![Edge {
                from: "member:alice#0001".to_string(),
                to: "guild:A".to_string(),
                color: "#AABBCC".to_string(),
                guild: "A".to_string(),
            }],
        };

        let guilds = ["A".to_string(), "B".to_string()].into();
        render_page(&cfg, &log, &table, &spec, &guilds).unwrap()
    }

    #[test]
    fn page_embeds_log_table_and_graph() {
        let page = fixture_page();

        assert!(page.contains("Access denied to guild: [Z]"));
        assert!(page.contains("<td>alice#0001</td>"));
        assert!(page.contains("num_mutual_guilds"));
        assert!(page.contains("\"id\":\"guild:A\""));
    }

    #[test]
    fn one_checkbox_per_guild_choice() {
        let page = fixture_page();
        assert_eq!(page.matches("guild-toggle\" value=").count(), 2);
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            escape_html("<script>&\"x\"'"),
            "&lt;script&gt;&amp;&quot;x&quot;&#39;"
        );
    }
}
