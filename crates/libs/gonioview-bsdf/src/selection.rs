//! Resolution of screen-space rectangles into sample points, combination
//! with the previous selection and selection statistics.

use base::math::{project_to_screen, IVec2, Mat4, UVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// How a new rectangle combines with the current selection.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// The rectangle replaces the current selection.
    #[default]
    Standard,
    /// The rectangle is added to the current selection.
    Add,
    /// The rectangle is removed from the current selection.
    Subtract,
}

impl SelectionMode {
    /// New flag of a point given its previous flag and whether the rectangle
    /// contains it.
    pub fn combine(self, prior: SelectionFlag, contained: bool) -> SelectionFlag {
        let selected = match self {
            SelectionMode::Standard => contained,
            SelectionMode::Add => prior.is_selected() || contained,
            SelectionMode::Subtract => prior.is_selected() && !contained,
        };
        SelectionFlag::from(selected)
    }
}

impl Display for SelectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::Standard => write!(f, "standard"),
            SelectionMode::Add => write!(f, "add"),
            SelectionMode::Subtract => write!(f, "subtract"),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "replace" => Ok(SelectionMode::Standard),
            "add" => Ok(SelectionMode::Add),
            "subtract" | "sub" => Ok(SelectionMode::Subtract),
            other => Err(format!("unknown selection mode: {}", other)),
        }
    }
}

/// Selection state of one sample point.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum SelectionFlag {
    /// Not part of the selection.
    #[default]
    NotSelected,
    /// Part of the selection.
    Selected,
}

impl SelectionFlag {
    /// Whether the point is selected.
    pub fn is_selected(self) -> bool { self == SelectionFlag::Selected }
}

impl From<bool> for SelectionFlag {
    fn from(selected: bool) -> Self {
        if selected {
            SelectionFlag::Selected
        } else {
            SelectionFlag::NotSelected
        }
    }
}

/// Screen-space rectangle, in pixels, origin at the top-left corner.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct SelectionBox {
    /// Top-left corner.
    pub top_left: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl SelectionBox {
    /// Rectangle spanned by two opposite corners given in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            top_left: a.min(b),
            size: (a - b).abs(),
        }
    }

    /// Rectangle spanned by two opposite pixel corners given in any order.
    pub fn from_pixels(a: IVec2, b: IVec2) -> Self { Self::from_corners(a.as_vec2(), b.as_vec2()) }

    /// Whether the rectangle has zero (or invalid) width or height.
    pub fn is_empty(&self) -> bool { !(self.size.x > 0.0 && self.size.y > 0.0) }

    /// Whether `p` lies inside the rectangle, borders included. An empty
    /// rectangle contains nothing.
    pub fn contains(&self, p: Vec2) -> bool {
        if self.is_empty() {
            return false;
        }
        let d = p - self.top_left;
        d.x >= 0.0 && d.y >= 0.0 && d.x <= self.size.x && d.y <= self.size.y
    }
}

/// Updates `flags` with the points whose screen projection falls inside
/// `rect`, combined under `mode`.
///
/// `vertices[i]` is the 3D position of point `i`, projected through `mvp`
/// onto a canvas of size `canvas`. Points behind the eye are never
/// contained. Returns the number of selected points afterwards.
pub fn apply_selection(
    flags: &mut [SelectionFlag],
    vertices: &[Vec3],
    rect: &SelectionBox,
    mvp: &Mat4,
    canvas: UVec2,
    mode: SelectionMode,
) -> usize {
    debug_assert_eq!(flags.len(), vertices.len());
    let mut count = 0;
    for (flag, vertex) in flags.iter_mut().zip(vertices) {
        let contained = !rect.is_empty()
            && project_to_screen(*vertex, canvas, mvp)
                .is_some_and(|screen| rect.contains(screen.truncate()));
        *flag = mode.combine(*flag, contained);
        count += flag.is_selected() as usize;
    }
    count
}

/// Indices of the selected points, in increasing order.
pub fn selected_indices(flags: &[SelectionFlag]) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.is_selected().then_some(i))
        .collect()
}

/// Statistics of one channel restricted to the selected points.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct SelectionStats {
    /// Number of selected points.
    pub points_count: usize,
    /// Smallest intensity among the selected points.
    pub min_intensity: f32,
    /// Largest intensity among the selected points.
    pub max_intensity: f32,
    /// Mean intensity of the selected points.
    pub average_intensity: f32,
    /// Selected point with the largest intensity, `None` when nothing is
    /// selected. Ties go to the smallest index.
    pub highest_point_index: Option<usize>,
}

impl SelectionStats {
    /// Computes the statistics of the points of `indices`, reading their
    /// intensity with `intensity`.
    pub fn compute<E, F>(indices: &[usize], mut intensity: F) -> Result<Self, E>
    where
        F: FnMut(usize) -> Result<f32, E>,
    {
        let mut stats = SelectionStats {
            min_intensity: f32::INFINITY,
            max_intensity: f32::NEG_INFINITY,
            ..Default::default()
        };
        let mut sum = 0.0f64;
        for &i in indices {
            let v = intensity(i)?;
            if !v.is_finite() {
                continue;
            }
            if v < stats.min_intensity {
                stats.min_intensity = v;
            }
            if v > stats.max_intensity {
                stats.max_intensity = v;
                stats.highest_point_index = Some(i);
            }
            sum += v as f64;
            stats.points_count += 1;
        }
        if stats.points_count == 0 {
            return Ok(SelectionStats::default());
        }
        stats.average_intensity = (sum / stats.points_count as f64) as f32;
        Ok(stats)
    }

    /// Whether no point is selected.
    pub fn is_empty(&self) -> bool { self.highest_point_index.is_none() }
}
