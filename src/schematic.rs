//! Topology export: one representative genealogy rendered as an
//! SVG drawing and a newick string.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use ancestrat_core::{NodeId, Tree, TreeSequence};
use ancestrat_sim::{
    simulate_ancestry, Demography, DemographyError, SampleSet, SimulationParams,
};
use streaming_iterator::StreamingIterator;

use crate::error::Error;

// Layout constants for the SVG rendering.
const SVG_WIDTH: f64 = 800.0;
const SVG_HEIGHT_PER_TIP: f64 = 30.0;
const SVG_MARGIN: f64 = 40.0;
const SVG_LABEL_GAP: f64 = 6.0;

/// Render `tree` in newick/bracket notation.
///
/// Tips are labeled via `labels` (indexed by sample index);
/// branch lengths are in generations.
pub fn newick_string(tree: &Tree, root: NodeId, labels: &[String]) -> Result<String, Error> {
    let mut out = String::new();
    write_newick_node(tree, root, labels, &mut out)?;
    out.push(';');
    Ok(out)
}

fn write_newick_node(
    tree: &Tree,
    node: NodeId,
    labels: &[String],
    out: &mut String,
) -> Result<(), Error> {
    let children: Vec<NodeId> = tree.children(node)?.collect();
    if children.is_empty() {
        let index = tree.sample_index(node)?;
        match labels.get(usize::from(index)) {
            Some(label) => out.push_str(label),
            None => out.push_str(&format!("n{}", node.into_raw())),
        }
    } else {
        out.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_newick_node(tree, *child, labels, out)?;
            let branch =
                f64::from(tree.node_time(node)?) - f64::from(tree.node_time(*child)?);
            out.push_str(&format!(":{:.4}", branch));
        }
        out.push(')');
    }
    Ok(())
}

// Rectangular dendrogram: x maps time (root left, present right),
// y spreads the tips in traversal order.
fn layout_svg(tree: &Tree, root: NodeId, labels: &[String]) -> Result<String, Error> {
    let mut tips = vec![];
    collect_tips(tree, root, &mut tips)?;
    let height = 2.0 * SVG_MARGIN + SVG_HEIGHT_PER_TIP * tips.len() as f64;
    let max_time = f64::from(tree.node_time(root)?).max(1.0);
    let x_of = |node: NodeId| -> Result<f64, Error> {
        let t = f64::from(tree.node_time(node)?);
        Ok(SVG_MARGIN + (1.0 - t / max_time) * (SVG_WIDTH - 2.0 * SVG_MARGIN))
    };

    let mut y_map = vec![-1.0_f64; tree.num_nodes()];
    for (i, tip) in tips.iter().enumerate() {
        y_map[usize::from(*tip)] = SVG_MARGIN + SVG_HEIGHT_PER_TIP * i as f64;
    }

    let mut body = String::new();
    draw_node(tree, root, labels, &x_of, &mut y_map, &mut body)?;

    Ok(format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" \
         viewBox=\"0 0 {:.0} {:.0}\">\n{}</svg>\n",
        SVG_WIDTH, height, SVG_WIDTH, height, body
    ))
}

fn collect_tips(tree: &Tree, node: NodeId, tips: &mut Vec<NodeId>) -> Result<(), Error> {
    let children: Vec<NodeId> = tree.children(node)?.collect();
    if children.is_empty() {
        tips.push(node);
    }
    for child in children {
        collect_tips(tree, child, tips)?;
    }
    Ok(())
}

// Post-order: children first so that an internal node can sit at
// the midpoint of its children's vertical extent.
fn draw_node(
    tree: &Tree,
    node: NodeId,
    labels: &[String],
    x_of: &dyn Fn(NodeId) -> Result<f64, Error>,
    y_map: &mut Vec<f64>,
    body: &mut String,
) -> Result<f64, Error> {
    let children: Vec<NodeId> = tree.children(node)?.collect();
    let x = x_of(node)?;
    if children.is_empty() {
        let y = y_map[usize::from(node)];
        let index = tree.sample_index(node)?;
        let label = match labels.get(usize::from(index)) {
            Some(l) => l.clone(),
            None => format!("n{}", node.into_raw()),
        };
        body.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" \
             dominant-baseline=\"middle\">{}</text>\n",
            x + SVG_LABEL_GAP,
            y,
            label
        ));
        return Ok(y);
    }

    let mut child_ys = vec![];
    for child in &children {
        let cy = draw_node(tree, *child, labels, x_of, y_map, body)?;
        let cx = x_of(*child)?;
        child_ys.push((cy, cx));
    }
    let y = (child_ys[0].0 + child_ys[child_ys.len() - 1].0) / 2.0;
    y_map[usize::from(node)] = y;
    for (cy, cx) in &child_ys {
        // horizontal branch to the child, vertical connector at
        // this node's time
        body.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" \
             stroke=\"black\"/>\n",
            x, *cy, *cx, *cy
        ));
        body.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" \
             stroke=\"black\"/>\n",
            x, y, x, *cy
        ));
    }
    Ok(y)
}

/// Export the demography's topology as a drawable tree.
///
/// Runs a recombination-free, single-position ancestry simulation
/// over one haploid sample per leaf population, so the whole
/// genome shares one genealogy, then writes that genealogy as an
/// SVG drawing to `svg_path` and as a newline-terminated newick
/// string to `txt_path`.
///
/// The fixed `seed` makes repeated runs produce the identical
/// tree.
///
/// # Returns
///
/// The newick string, for console output.
///
/// # Errors
///
/// [`DemographyError::NoLeafPopulations`] (before any simulation)
/// if the demography has no population to sample from; otherwise
/// simulation or I/O errors.
pub fn export_schematic(
    demography: &Demography,
    svg_path: &Path,
    txt_path: &Path,
    seed: u64,
) -> Result<String, Error> {
    let leaves = demography.leaf_populations();
    if leaves.is_empty() {
        return Err(DemographyError::NoLeafPopulations.into());
    }
    let sample_sets: Vec<SampleSet> = leaves
        .iter()
        .map(|p| SampleSet::new_with_ploidy(demography.population_name(*p), 1, 1))
        .collect();
    let labels: Vec<String> = sample_sets
        .iter()
        .map(|s| s.population().to_string())
        .collect();

    let result = simulate_ancestry(
        demography,
        &sample_sets,
        &SimulationParams {
            sequence_length: 1,
            recombination_rate: 0.0,
            seed,
        },
    )?;
    let ts = TreeSequence::new(result.tables)?;
    let mut tree_iterator = ts.tree_iterator();
    let tree = match tree_iterator.next() {
        Some(t) => t,
        None => return Err(ancestrat_core::TreesError::NoSamples.into()),
    };
    let root = tree.root_of(ts.sample_nodes()[0])?;

    let svg = layout_svg(tree, root, &labels)?;
    let mut svg_file = File::create(svg_path)?;
    svg_file.write_all(svg.as_bytes())?;
    log::info!("wrote schematic drawing {}", svg_path.display());

    let newick = newick_string(tree, root, &labels)?;
    let mut txt_file = File::create(txt_path)?;
    writeln!(txt_file, "{}", newick)?;
    log::info!("wrote schematic tree {}", txt_path.display());

    Ok(newick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancestrat_core::{NodeFlags, TableCollection};

    fn three_tip_tree_sequence() -> TreeSequence {
        let mut tables = TableCollection::new(1).unwrap();
        let s = NodeFlags::IS_SAMPLE.bits();
        for _ in 0..3 {
            tables.add_node_with_flags(0.0, 0, s).unwrap();
        }
        let n3 = tables.add_node(10.0, 0).unwrap();
        let n4 = tables.add_node(25.0, 0).unwrap();
        tables.add_edge(0, 1, n3, 0).unwrap();
        tables.add_edge(0, 1, n3, 1).unwrap();
        tables.add_edge(0, 1, n4, n3).unwrap();
        tables.add_edge(0, 1, n4, 2).unwrap();
        tables.sort_tables();
        tables.build_indexes().unwrap();
        TreeSequence::new(tables).unwrap()
    }

    #[test]
    fn test_newick_shape() {
        let ts = three_tip_tree_sequence();
        let mut tree_iterator = ts.tree_iterator();
        let tree = tree_iterator.next().unwrap();
        let root = tree.root_of(0).unwrap();
        let labels = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        // children appear in edge-insertion order: the direct
        // tip C attaches to the root before the internal clade
        let newick = newick_string(tree, root, &labels).unwrap();
        assert_eq!(newick, "(C:25.0000,(A:10.0000,B:10.0000):15.0000);");
    }

    #[test]
    fn test_svg_mentions_every_tip() {
        let ts = three_tip_tree_sequence();
        let mut tree_iterator = ts.tree_iterator();
        let tree = tree_iterator.next().unwrap();
        let root = tree.root_of(0).unwrap();
        let labels = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let svg = layout_svg(tree, root, &labels).unwrap();
        assert!(svg.starts_with("<svg"));
        for label in &labels {
            assert!(svg.contains(&format!(">{}</text>", label)));
        }
    }
}
