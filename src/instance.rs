//! Instance and side-info readers.
//!
//! Two instance flavors exist on disk. CG:SHOP 2022 instances carry vertex
//! coordinates and segment endpoint indices; the crossing matrix is computed
//! from the geometry. Anything else is treated as a DIMACS-style adjacency
//! list that names the crossing pairs directly, with no geometry at all.

use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::crossings::CrossingMap;
use crate::geom::{Point, Segment};
use crate::segments::{SegIdx, Segments};
use crate::Error;

/// A loaded problem instance.
#[derive(Debug)]
pub struct Instance {
    /// The instance identifier, echoed into solutions.
    pub id: String,
    /// Segment geometry; `None` for adjacency-list instances.
    pub segments: Option<Segments>,
    /// The crossing matrix, ready for the heuristics.
    pub crossings: CrossingMap,
}

#[derive(Deserialize)]
struct CgshopDoc {
    id: String,
    x: Vec<i64>,
    y: Vec<i64>,
    edge_i: Vec<usize>,
    edge_j: Vec<usize>,
}

#[derive(Deserialize)]
struct AdjacencyDoc {
    id: String,
    edges: usize,
    pairs: Vec<(usize, usize)>,
}

impl Instance {
    /// Read an instance file.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let instance = Self::from_json(&text)?;
        info!(
            "instance {}: {} segments{}",
            instance.id,
            instance.crossings.len(),
            if instance.segments.is_some() {
                ""
            } else {
                " (adjacency only)"
            }
        );
        Ok(instance)
    }

    /// Parse an instance from a JSON string.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let doc: serde_json::Value = serde_json::from_str(text)?;
        let is_cgshop = doc
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::Malformed("instance has no `type` field".into()))?
            == "Instance_CGSHOP2022";
        if is_cgshop {
            Self::from_cgshop(serde_json::from_value(doc)?)
        } else {
            Self::from_adjacency(serde_json::from_value(doc)?)
        }
    }

    fn from_cgshop(doc: CgshopDoc) -> Result<Self, Error> {
        if doc.x.len() != doc.y.len() {
            return Err(Error::Malformed(
                "coordinate arrays have different lengths".into(),
            ));
        }
        if doc.edge_i.len() != doc.edge_j.len() {
            return Err(Error::Malformed(
                "edge index arrays have different lengths".into(),
            ));
        }

        let mut segments = Segments::default();
        for (&i, &j) in doc.edge_i.iter().zip(&doc.edge_j) {
            if i >= doc.x.len() || j >= doc.x.len() {
                return Err(Error::Malformed(format!(
                    "edge ({i}, {j}) points outside the {} vertices",
                    doc.x.len()
                )));
            }
            segments.push(Segment::new(
                Point::new(doc.x[i], doc.y[i]),
                Point::new(doc.x[j], doc.y[j]),
            ));
        }

        let crossings = CrossingMap::from_segments(&segments);
        Ok(Instance {
            id: doc.id,
            segments: Some(segments),
            crossings,
        })
    }

    fn from_adjacency(doc: AdjacencyDoc) -> Result<Self, Error> {
        // Pairs are one-based on the wire.
        let mut pairs = Vec::with_capacity(doc.pairs.len());
        for &(i, j) in &doc.pairs {
            if i == 0 || j == 0 || i > doc.edges || j > doc.edges {
                return Err(Error::Malformed(format!(
                    "crossing pair ({i}, {j}) is not within 1..={}",
                    doc.edges
                )));
            }
            pairs.push((i - 1, j - 1));
        }
        Ok(Instance {
            id: doc.id,
            segments: None,
            crossings: CrossingMap::from_edges(doc.edges, pairs),
        })
    }
}

/// Read the `clique` array from a side-info file.
pub fn read_clique(path: &Path, n: usize) -> Result<Vec<SegIdx>, Error> {
    #[derive(Deserialize)]
    struct InfoDoc {
        clique: Vec<usize>,
    }

    let text = std::fs::read_to_string(path)?;
    let doc: InfoDoc = serde_json::from_str(&text)?;
    let mut clique = Vec::with_capacity(doc.clique.len());
    for i in doc.clique {
        if i >= n {
            return Err(Error::Malformed(format!(
                "clique member {i} is not a segment index"
            )));
        }
        clique.push(SegIdx(i));
    }
    info!("clique of size {} loaded", clique.len());
    Ok(clique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cgshop_instance_builds_geometry_and_crossings() {
        let text = r#"{
            "type": "Instance_CGSHOP2022",
            "id": "tiny",
            "x": [0, 10, 5, 5],
            "y": [0, 0, -5, 5],
            "edge_i": [0, 2],
            "edge_j": [1, 3]
        }"#;
        let instance = Instance::from_json(text).unwrap();
        assert_eq!(instance.id, "tiny");
        assert_eq!(instance.crossings.len(), 2);
        assert!(instance.segments.is_some());
        assert!(instance.crossings.crosses(SegIdx(0), SegIdx(1)));
    }

    #[test]
    fn adjacency_instance_skips_geometry() {
        let text = r#"{
            "type": "graph",
            "id": "k3",
            "edges": 3,
            "pairs": [[1, 2], [2, 3], [1, 3]]
        }"#;
        let instance = Instance::from_json(text).unwrap();
        assert!(instance.segments.is_none());
        assert_eq!(instance.crossings.len(), 3);
        assert!(instance.crossings.crosses(SegIdx(0), SegIdx(2)));
    }

    #[test]
    fn out_of_range_pairs_are_rejected() {
        let text = r#"{"type": "graph", "id": "bad", "edges": 2, "pairs": [[1, 3]]}"#;
        assert!(matches!(
            Instance::from_json(text),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(Instance::from_json(r#"{"id": "x"}"#).is_err());
        assert!(Instance::from_json(r#"{"type": "Instance_CGSHOP2022", "id": "x"}"#).is_err());
        assert!(Instance::from_json("not json").is_err());
    }
}
