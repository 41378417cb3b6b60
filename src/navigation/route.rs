//! Route construction.
//!
//! Each pair of consecutive waypoints becomes a [`RouteEdge`], decided once
//! here rather than re-checked while driving. An edge listed in the wide arc
//! table becomes [`RouteEdge::WideArc`]; every other edge must be a single
//! grid step and becomes [`RouteEdge::NormalStep`] with its target heading
//! already computed, so a malformed route fails before any motion.

use super::heading::desired_heading;
use crate::config::{RouteConfig, WideArcEdgeConfig};
use crate::core::types::{GridPosition, Heading, Side};
use crate::error::{Error, Result};

/// Steered half-circle used where composing 90° turns is unreliable.
///
/// The heading after the maneuver is taken from configuration, not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideArcManeuver {
    /// Steering lock direction
    pub side: Side,
    /// Heading force-set once the maneuver completes
    pub heading_after: Heading,
}

/// Transition between two consecutive waypoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEdge {
    /// Turn toward `target` then drive one cell
    NormalStep { target: Heading },
    /// Dedicated wide arc maneuver
    WideArc(WideArcManeuver),
}

impl RouteEdge {
    /// Heading once this edge has been traversed
    pub fn heading_after(&self) -> Heading {
        match self {
            RouteEdge::NormalStep { target } => *target,
            RouteEdge::WideArc(arc) => arc.heading_after,
        }
    }
}

/// Ordered, non-empty waypoint sequence with precomputed edges
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<GridPosition>,
    edges: Vec<RouteEdge>,
}

impl Route {
    /// Build a route, tagging the listed transitions as wide arcs
    pub fn new(waypoints: Vec<GridPosition>, wide_arcs: &[WideArcEdgeConfig]) -> Result<Self> {
        if waypoints.is_empty() {
            return Err(Error::InvalidRoute("route has no waypoints".to_string()));
        }

        for (i, arc) in wide_arcs.iter().enumerate() {
            if arc.from == arc.to {
                return Err(Error::InvalidRoute(format!(
                    "wide arc {} starts and ends at {}",
                    i, arc.from
                )));
            }
            if wide_arcs[..i]
                .iter()
                .any(|other| other.from == arc.from && other.to == arc.to)
            {
                return Err(Error::InvalidRoute(format!(
                    "wide arc {} -> {} listed twice",
                    arc.from, arc.to
                )));
            }
        }

        let mut edges = Vec::with_capacity(waypoints.len().saturating_sub(1));
        for pair in waypoints.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let edge = match wide_arcs.iter().find(|a| a.from == from && a.to == to) {
                Some(arc) => {
                    log::info!(
                        "Route edge {} -> {}: wide arc to the {:?}, then heading {}",
                        from,
                        to,
                        arc.side,
                        arc.heading_after
                    );
                    RouteEdge::WideArc(WideArcManeuver {
                        side: arc.side,
                        heading_after: arc.heading_after,
                    })
                }
                None => {
                    let (dx, dy) = from.delta_to(&to);
                    RouteEdge::NormalStep {
                        target: desired_heading(dx, dy)?,
                    }
                }
            };
            edges.push(edge);
        }

        for arc in wide_arcs {
            let used = waypoints
                .windows(2)
                .any(|pair| pair[0] == arc.from && pair[1] == arc.to);
            if !used {
                log::warn!(
                    "Wide arc {} -> {} does not match any route transition",
                    arc.from,
                    arc.to
                );
            }
        }

        Ok(Self { waypoints, edges })
    }

    pub fn from_config(config: &RouteConfig) -> Result<Self> {
        Self::new(config.waypoints.clone(), &config.wide_arcs())
    }

    /// Number of waypoints
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; construction rejects empty routes
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[GridPosition] {
        &self.waypoints
    }

    pub fn position(&self, index: usize) -> Option<GridPosition> {
        self.waypoints.get(index).copied()
    }

    /// Edges in order; `edges()[i]` leads from waypoint `i` to `i + 1`
    pub fn edges(&self) -> &[RouteEdge] {
        &self.edges
    }

    /// Heading after traversing the whole route from `start`
    pub fn final_heading(&self, start: Heading) -> Heading {
        self.edges.last().map_or(start, RouteEdge::heading_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(points: &[(i32, i32)]) -> Vec<GridPosition> {
        points.iter().map(|&(x, y)| GridPosition::new(x, y)).collect()
    }

    fn u_turn_arc() -> WideArcEdgeConfig {
        WideArcEdgeConfig {
            from: GridPosition::new(2, 0),
            to: GridPosition::new(2, 1),
            side: Side::Left,
            heading_after: Heading::West,
        }
    }

    #[test]
    fn test_straight_route_edges() {
        let route = Route::new(positions(&[(0, 0), (1, 0), (2, 0)]), &[]).unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(
            route.edges(),
            &[
                RouteEdge::NormalStep {
                    target: Heading::East
                },
                RouteEdge::NormalStep {
                    target: Heading::East
                }
            ]
        );
        assert_eq!(route.final_heading(Heading::East), Heading::East);
    }

    #[test]
    fn test_wide_arc_edge_is_tagged() {
        let route = Route::new(
            positions(&[(0, 0), (1, 0), (2, 0), (2, 1), (1, 1), (0, 1)]),
            &[u_turn_arc()],
        )
        .unwrap();
        assert!(matches!(route.edges()[2], RouteEdge::WideArc(_)));
        assert_eq!(
            route.edges()[3],
            RouteEdge::NormalStep {
                target: Heading::West
            }
        );
        assert_eq!(route.final_heading(Heading::East), Heading::West);
    }

    #[test]
    fn test_wide_arc_allows_non_adjacent_jump() {
        let arc = WideArcEdgeConfig {
            from: GridPosition::new(2, 0),
            to: GridPosition::new(2, 2),
            side: Side::Right,
            heading_after: Heading::West,
        };
        let route = Route::new(positions(&[(1, 0), (2, 0), (2, 2)]), &[arc]).unwrap();
        assert_eq!(
            route.edges()[1],
            RouteEdge::WideArc(WideArcManeuver {
                side: Side::Right,
                heading_after: Heading::West
            })
        );
    }

    #[test]
    fn test_diagonal_step_rejected_before_motion() {
        let err = Route::new(positions(&[(0, 0), (1, 1)]), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidMove { dx: 1, dy: 1 }));

        let err = Route::new(positions(&[(0, 0), (0, 0)]), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidMove { dx: 0, dy: 0 }));
    }

    #[test]
    fn test_empty_and_duplicate_arcs_rejected() {
        assert!(matches!(
            Route::new(Vec::new(), &[]),
            Err(Error::InvalidRoute(_))
        ));
        assert!(matches!(
            Route::new(positions(&[(2, 0), (2, 1)]), &[u_turn_arc(), u_turn_arc()]),
            Err(Error::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_custom_route_ignores_builtin_u_turn() {
        let config = RouteConfig {
            waypoints: positions(&[(1, 0), (2, 0), (2, 1)]),
            wide_arc: None,
        };
        let route = Route::from_config(&config).unwrap();
        assert_eq!(
            route.edges()[1],
            RouteEdge::NormalStep {
                target: Heading::North
            }
        );
        assert_eq!(route.final_heading(Heading::East), Heading::North);

        let route = Route::from_config(&RouteConfig::default()).unwrap();
        assert!(matches!(route.edges()[2], RouteEdge::WideArc(_)));
    }

    #[test]
    fn test_single_waypoint_route_has_no_edges() {
        let route = Route::new(positions(&[(3, 3)]), &[]).unwrap();
        assert!(route.edges().is_empty());
        assert_eq!(route.final_heading(Heading::South), Heading::South);
    }
}
