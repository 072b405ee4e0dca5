//! Bubble colors and special kinds

use serde::{Deserialize, Serialize};

/// Colors a level palette can draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl BubbleColor {
    pub const ALL: [Self; 6] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::Purple,
        Self::Orange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BubbleColor::Red => "red",
            BubbleColor::Blue => "blue",
            BubbleColor::Green => "green",
            BubbleColor::Yellow => "yellow",
            BubbleColor::Purple => "purple",
            BubbleColor::Orange => "orange",
        }
    }
}

/// Special behavior carried by a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialKind {
    #[default]
    Normal,
    /// Clears everything around it when it lands or is popped
    Bomb,
    /// Wildcard: joins any color cluster
    Rainbow,
    /// Reported on removal; the caller slows descent
    Freeze,
    /// Reported on removal; the caller shows the aim guide
    Aim,
    /// Colorless blocker, never matches
    Obstacle,
}

impl SpecialKind {
    /// Kinds reported as triggered effects when removed
    pub fn is_trigger(&self) -> bool {
        matches!(self, SpecialKind::Freeze | SpecialKind::Aim)
    }
}

/// Contents of an occupied cell (or a projectile / queued candidate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bubble {
    /// None only for obstacles
    pub color: Option<BubbleColor>,
    pub kind: SpecialKind,
}

impl Bubble {
    pub fn normal(color: BubbleColor) -> Self {
        Self {
            color: Some(color),
            kind: SpecialKind::Normal,
        }
    }

    /// Colored bubble of the given kind; `Obstacle` drops the color
    pub fn special(color: BubbleColor, kind: SpecialKind) -> Self {
        if kind == SpecialKind::Obstacle {
            return Self::obstacle();
        }
        Self {
            color: Some(color),
            kind,
        }
    }

    pub fn obstacle() -> Self {
        Self {
            color: None,
            kind: SpecialKind::Obstacle,
        }
    }

    /// Whether this bubble joins a cluster of `target` color
    #[inline]
    pub fn matches(&self, target: BubbleColor) -> bool {
        match self.kind {
            SpecialKind::Obstacle => false,
            SpecialKind::Rainbow => true,
            _ => self.color == Some(target),
        }
    }
}
