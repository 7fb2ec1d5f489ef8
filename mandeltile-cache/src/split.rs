//! Dividing a tile's sample axes among its children.
//!
//! Child `i` of a tile with fanout `f` covers y-group `i / f` (top to bottom,
//! following the stored high-to-low `y_line`) and x-group `i % f` (left to
//! right).

use crate::SplitMode;
use mandeltile_core::{linspace, MandelError, Result, SampleAxes};

/// Split `line` into `parts` contiguous runs.
///
/// The first `len % parts` runs hold one extra sample, so runs differ in
/// length by at most one and concatenate back to `line`.
pub fn partition(line: &[f64], parts: usize) -> Result<Vec<Vec<f64>>> {
    if parts == 0 || parts > line.len() {
        return Err(MandelError::configuration(format!(
            "cannot split {} samples into {} non-empty parts",
            line.len(),
            parts
        )));
    }
    let base = line.len() / parts;
    let extra = line.len() % parts;

    let mut runs = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        runs.push(line[start..start + len].to_vec());
        start += len;
    }
    Ok(runs)
}

/// Resample `line` at `factor` times its length, keeping both end points.
pub fn refine(line: &[f64], factor: usize) -> Result<Vec<f64>> {
    match line {
        [first, .., last] if factor > 0 => Ok(linspace(*first, *last, line.len() * factor, true)),
        _ => Err(MandelError::configuration(format!(
            "cannot refine {} samples by a factor of {}",
            line.len(),
            factor
        ))),
    }
}

fn split_line(line: &[f64], fanout: usize, mode: SplitMode) -> Result<Vec<Vec<f64>>> {
    match mode {
        SplitMode::Partition => partition(line, fanout),
        SplitMode::Refine => partition(&refine(line, fanout)?, fanout),
    }
}

/// Axes of every child of `parent`, in child-index order.
pub fn child_axes(parent: &SampleAxes, fanout: u32, mode: SplitMode) -> Result<Vec<SampleAxes>> {
    let fanout = fanout as usize;
    let x_runs = split_line(parent.x_line(), fanout, mode)?;
    let y_runs = split_line(parent.y_line(), fanout, mode)?;

    let mut children = Vec::with_capacity(fanout * fanout);
    for y_run in &y_runs {
        for x_run in &x_runs {
            children.push(SampleAxes::new(x_run.clone(), y_run.clone())?);
        }
    }
    Ok(children)
}

/// Axes of child `index` of `parent`.
pub fn child_axes_at(
    parent: &SampleAxes,
    fanout: u32,
    mode: SplitMode,
    index: u32,
) -> Result<SampleAxes> {
    if index >= fanout * fanout {
        return Err(MandelError::validation(format!(
            "child index {index} out of range for fanout {fanout}"
        )));
    }
    let row = (index / fanout) as usize;
    let col = (index % fanout) as usize;
    let mut x_runs = split_line(parent.x_line(), fanout as usize, mode)?;
    let mut y_runs = split_line(parent.y_line(), fanout as usize, mode)?;
    SampleAxes::new(x_runs.swap_remove(col), y_runs.swap_remove(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(runs: &[Vec<f64>]) -> Vec<f64> {
        runs.iter().flatten().copied().collect()
    }

    #[test]
    fn partition_distributes_remainder_first() {
        let line: Vec<f64> = (0..7).map(f64::from).collect();
        let runs = partition(&line, 3).unwrap();
        let lens: Vec<usize> = runs.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![3, 2, 2]);
        assert_eq!(concat(&runs), line);
    }

    #[test]
    fn partition_rejects_too_many_parts() {
        assert!(partition(&[1.0, 2.0], 3).is_err());
        assert!(partition(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn refine_keeps_end_points() {
        let refined = refine(&[-2.0, -1.0, 0.0, 1.0], 2).unwrap();
        assert_eq!(refined.len(), 8);
        assert_eq!(refined[0], -2.0);
        assert_eq!(refined[7], 1.0);
        assert!(refine(&[1.0], 2).is_err());
    }

    #[test]
    fn children_reconstruct_parent_axes() {
        let parent = SampleAxes::new(
            (0..10).map(|i| i as f64 * 0.1).collect(),
            (0..6).map(|i| 1.0 - i as f64 * 0.2).collect(),
        )
        .unwrap();

        for fanout in [2u32, 3] {
            let children = child_axes(&parent, fanout, SplitMode::Partition).unwrap();
            assert_eq!(children.len(), (fanout * fanout) as usize);

            // First row of children carries every x-run once.
            let xs: Vec<f64> = children[..fanout as usize]
                .iter()
                .flat_map(|c| c.x_line().to_vec())
                .collect();
            assert_eq!(xs, parent.x_line());

            // First column of children carries every y-run once.
            let ys: Vec<f64> = children
                .iter()
                .step_by(fanout as usize)
                .flat_map(|c| c.y_line().to_vec())
                .collect();
            assert_eq!(ys, parent.y_line());
        }
    }

    #[test]
    fn refined_children_keep_parent_resolution() {
        let parent = SampleAxes::new(vec![0.0, 1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0, 0.0]).unwrap();
        let children = child_axes(&parent, 2, SplitMode::Refine).unwrap();
        for child in &children {
            assert_eq!(child.width(), 4);
            assert_eq!(child.height(), 4);
        }
        // Top-left child starts at the parent's top-left corner.
        assert_eq!(children[0].x_line()[0], 0.0);
        assert_eq!(children[0].y_line()[0], 3.0);
        // Bottom-right child ends at the parent's bottom-right corner.
        assert_eq!(*children[3].x_line().last().unwrap(), 3.0);
        assert_eq!(*children[3].y_line().last().unwrap(), 0.0);
    }

    #[test]
    fn child_at_matches_full_split() {
        let parent = SampleAxes::new(
            (0..9).map(f64::from).collect(),
            (0..5).rev().map(f64::from).collect(),
        )
        .unwrap();
        for mode in [SplitMode::Partition, SplitMode::Refine] {
            let all = child_axes(&parent, 2, mode).unwrap();
            for (i, expected) in all.iter().enumerate() {
                assert_eq!(&child_axes_at(&parent, 2, mode, i as u32).unwrap(), expected);
            }
        }
        assert!(child_axes_at(&parent, 2, SplitMode::Partition, 4).is_err());
    }
}
