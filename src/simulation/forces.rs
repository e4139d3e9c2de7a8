use eframe::egui::{Pos2, Vec2, vec2};
use serde::Deserialize;

use super::quadtree::QuadNode;
use super::{GraphLink, GraphNode};

/// Everything a force may read or write during one tick. Forces only touch
/// velocities; integration happens afterwards in [`super::Simulation::tick`].
pub struct ForceContext<'a> {
    pub nodes: &'a mut [GraphNode],
    pub links: &'a [GraphLink],
    pub alpha: f32,
    pub(super) scratch: &'a mut ForceScratch,
}

#[derive(Default)]
pub(super) struct ForceScratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
}

impl ForceScratch {
    fn snapshot(&mut self, nodes: &[GraphNode], predict: bool) {
        self.positions.clear();
        self.positions.extend(nodes.iter().map(|node| {
            if predict {
                node.position + node.velocity
            } else {
                node.position
            }
        }));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CenterForce {
    /// Set from the drawing surface, never from configuration.
    #[serde(skip)]
    pub center: Pos2,
    pub strength: f32,
}

impl Default for CenterForce {
    fn default() -> Self {
        Self {
            center: Pos2::ZERO,
            strength: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManyBodyForce {
    /// Negative values repel.
    pub strength: f32,
    /// Barnes-Hut opening angle; `0.0` means exact pairwise evaluation.
    pub theta: f32,
    pub distance_min: f32,
    pub distance_max: f32,
}

impl Default for ManyBodyForce {
    fn default() -> Self {
        Self {
            strength: -120.0,
            theta: 0.9,
            distance_min: 1.0,
            distance_max: f32::INFINITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkForce {
    pub distance: f32,
    /// `None` uses `1 / min(degree(source), degree(target))` per link.
    pub strength: Option<f32>,
    pub iterations: usize,
}

impl Default for LinkForce {
    fn default() -> Self {
        Self {
            distance: 80.0,
            strength: None,
            iterations: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollideForce {
    pub strength: f32,
    /// Extra clearance added to every node radius.
    pub padding: f32,
}

impl Default for CollideForce {
    fn default() -> Self {
        Self {
            strength: 0.7,
            padding: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Force {
    Center(CenterForce),
    ManyBody(ManyBodyForce),
    Link(LinkForce),
    Collide(CollideForce),
}

impl Force {
    pub fn apply(&self, ctx: &mut ForceContext<'_>) {
        match self {
            Self::Center(force) => apply_center(force, ctx),
            Self::ManyBody(force) => apply_many_body(force, ctx),
            Self::Link(force) => apply_links(force, ctx),
            Self::Collide(force) => apply_collide(force, ctx),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Center(_) => "center",
            Self::ManyBody(_) => "many-body",
            Self::Link(_) => "link",
            Self::Collide(_) => "collide",
        }
    }
}

/// Deterministic unit direction for coincident points.
fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

fn apply_center(force: &CenterForce, ctx: &mut ForceContext<'_>) {
    let scale = force.strength * ctx.alpha;
    let center = force.center.to_vec2();
    for node in ctx.nodes.iter_mut().filter(|node| node.fixed.is_none()) {
        node.velocity += (center - node.position) * scale;
    }
}

fn apply_many_body(force: &ManyBodyForce, ctx: &mut ForceContext<'_>) {
    if ctx.nodes.len() < 2 {
        return;
    }

    ctx.scratch.snapshot(ctx.nodes, false);
    let positions = &ctx.scratch.positions;
    let Some(tree) = QuadNode::build(positions) else {
        return;
    };

    let params = ManyBodyParams {
        scale: force.strength * ctx.alpha,
        theta_sq: force.theta * force.theta,
        distance_min_sq: force.distance_min * force.distance_min,
        distance_max_sq: force.distance_max * force.distance_max,
    };
    for (index, node) in ctx.nodes.iter_mut().enumerate() {
        accumulate_many_body(&tree, index, positions, params, &mut node.velocity);
    }
}

#[derive(Clone, Copy)]
struct ManyBodyParams {
    scale: f32,
    theta_sq: f32,
    distance_min_sq: f32,
    distance_max_sq: f32,
}

impl ManyBodyParams {
    /// Velocity contribution of `mass` located `delta` away.
    fn contribution(self, mut delta: Vec2, mass: f32, from: usize, to: usize) -> Option<Vec2> {
        let mut distance_sq = delta.length_sq();
        if distance_sq >= self.distance_max_sq {
            return None;
        }
        if distance_sq == 0.0 {
            delta = jiggle(from, to);
            distance_sq = delta.length_sq();
        }
        if distance_sq < self.distance_min_sq {
            distance_sq = (self.distance_min_sq * distance_sq).sqrt();
        }
        Some(delta * (self.scale * mass / distance_sq))
    }
}

fn accumulate_many_body(
    cell: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ManyBodyParams,
    velocity: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.indices {
            if other == index {
                continue;
            }
            if let Some(change) = params.contribution(positions[other] - point, 1.0, index, other)
            {
                *velocity += change;
            }
        }
        return;
    }

    let delta = cell.center_of_mass - point;
    let side = cell.bounds.side_length();
    let can_approximate = params.theta_sq > 0.0
        && !cell.bounds.contains(point)
        && side * side < params.theta_sq * delta.length_sq();

    if can_approximate {
        if let Some(change) = params.contribution(delta, cell.mass, index, usize::MAX) {
            *velocity += change;
        }
        return;
    }

    for child in cell.children() {
        accumulate_many_body(child, index, positions, params, velocity);
    }
}

fn apply_links(force: &LinkForce, ctx: &mut ForceContext<'_>) {
    for _ in 0..force.iterations.max(1) {
        for link in ctx.links {
            if link.source == link.target {
                continue;
            }

            let source = &ctx.nodes[link.source];
            let target = &ctx.nodes[link.target];
            let mut delta = (target.position + target.velocity) - (source.position + source.velocity);
            if delta.length_sq() == 0.0 {
                delta = jiggle(link.source, link.target);
            }
            let length = delta.length();
            let distance = link.distance.unwrap_or(force.distance);
            let strength = link
                .strength
                .or(force.strength)
                .unwrap_or(link.degree_strength);
            let correction = delta * ((length - distance) / length * ctx.alpha * strength);

            ctx.nodes[link.target].velocity -= correction * link.bias;
            ctx.nodes[link.source].velocity += correction * (1.0 - link.bias);
        }
    }
}

#[derive(Clone, Copy)]
struct CollisionParams {
    strength: f32,
    max_reach_sq: f32,
}

fn apply_collide(force: &CollideForce, ctx: &mut ForceContext<'_>) {
    let node_count = ctx.nodes.len();
    if node_count < 2 {
        return;
    }

    ctx.scratch.snapshot(ctx.nodes, true);
    ctx.scratch.radii.clear();
    ctx.scratch
        .radii
        .extend(ctx.nodes.iter().map(|node| node.radius + force.padding));
    ctx.scratch.deltas.clear();
    ctx.scratch.deltas.resize(node_count, Vec2::ZERO);

    let scratch = &mut *ctx.scratch;
    let Some(tree) = QuadNode::build(&scratch.positions) else {
        return;
    };
    let max_radius = scratch.radii.iter().copied().fold(0.0_f32, f32::max);
    let max_reach = max_radius * 2.0;
    let params = CollisionParams {
        strength: force.strength,
        max_reach_sq: max_reach * max_reach,
    };

    accumulate_collision_pairs(
        &tree,
        &tree,
        true,
        &scratch.positions,
        &scratch.radii,
        params,
        &mut scratch.deltas,
    );

    for (node, delta) in ctx.nodes.iter_mut().zip(&scratch.deltas) {
        node.velocity += *delta;
    }
}

fn separate_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let mut delta = positions[from] - positions[to];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }
    if distance_sq == 0.0 {
        delta = jiggle(from, to);
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((reach - distance) / distance * params.strength);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    // The smaller node moves further.
    let ratio = to_sq / (from_sq + to_sq);
    deltas[from] += push * ratio;
    deltas[to] -= push * (1.0 - ratio);
}

fn accumulate_collision_pairs(
    cell_a: &QuadNode,
    cell_b: &QuadNode,
    same_cell: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    if cell_a.bounds.distance_sq_to(cell_b.bounds) > params.max_reach_sq {
        return;
    }

    if cell_a.is_leaf() && cell_b.is_leaf() {
        if same_cell {
            for (offset, &from) in cell_a.indices.iter().enumerate() {
                for &to in &cell_a.indices[offset + 1..] {
                    separate_pair(from, to, positions, radii, params, deltas);
                }
            }
        } else {
            for &from in &cell_a.indices {
                for &to in &cell_b.indices {
                    separate_pair(from, to, positions, radii, params, deltas);
                }
            }
        }
        return;
    }

    if same_cell {
        let children = cell_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, deltas);
            for child_b in &children[offset + 1..] {
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, deltas,
                );
            }
        }
        return;
    }

    let split_a = if cell_a.is_leaf() {
        false
    } else if cell_b.is_leaf() {
        true
    } else {
        cell_a.bounds.half_extent >= cell_b.bounds.half_extent
    };

    if split_a {
        for child in cell_a.children() {
            accumulate_collision_pairs(child, cell_b, false, positions, radii, params, deltas);
        }
    } else {
        for child in cell_b.children() {
            accumulate_collision_pairs(cell_a, child, false, positions, radii, params, deltas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityId;

    fn node(id: &str, x: f32, y: f32) -> GraphNode {
        GraphNode::new(EntityId::new(id), vec2(x, y), 6.0)
    }

    fn run(force: Force, nodes: &mut [GraphNode], links: &[GraphLink]) {
        let mut scratch = ForceScratch::default();
        let mut ctx = ForceContext {
            nodes,
            links,
            alpha: 1.0,
            scratch: &mut scratch,
        };
        force.apply(&mut ctx);
    }

    #[test]
    fn center_pulls_free_nodes_only() {
        let mut nodes = vec![node("a", 100.0, 0.0), node("b", -50.0, 0.0)];
        nodes[1].fixed = Some(vec2(-50.0, 0.0));
        run(
            Force::Center(CenterForce {
                center: Pos2::ZERO,
                strength: 0.1,
            }),
            &mut nodes,
            &[],
        );

        assert_eq!(nodes[0].velocity, vec2(-10.0, 0.0));
        assert_eq!(nodes[1].velocity, Vec2::ZERO);
    }

    #[test]
    fn many_body_repels_symmetrically() {
        let mut nodes = vec![node("a", -10.0, 0.0), node("b", 10.0, 0.0)];
        run(Force::ManyBody(ManyBodyForce::default()), &mut nodes, &[]);

        assert!(nodes[0].velocity.x < 0.0);
        assert!(nodes[1].velocity.x > 0.0);
        assert!((nodes[0].velocity.x + nodes[1].velocity.x).abs() < 1e-5);
    }

    #[test]
    fn barnes_hut_tracks_exact_sum() {
        let make = || {
            (0..60)
                .map(|i| node(&i.to_string(), (i % 8) as f32 * 17.0, (i / 8) as f32 * 23.0))
                .collect::<Vec<_>>()
        };
        let mut exact = make();
        let mut approx = make();
        run(
            Force::ManyBody(ManyBodyForce {
                theta: 0.0,
                ..ManyBodyForce::default()
            }),
            &mut exact,
            &[],
        );
        run(
            Force::ManyBody(ManyBodyForce {
                theta: 0.6,
                ..ManyBodyForce::default()
            }),
            &mut approx,
            &[],
        );

        let scale = exact
            .iter()
            .map(|node| node.velocity.length())
            .fold(0.0_f32, f32::max);
        for (e, a) in exact.iter().zip(&approx) {
            let error = (e.velocity - a.velocity).length();
            assert!(error <= scale * 0.15, "error {error} against scale {scale}");
        }
    }

    #[test]
    fn link_pulls_stretched_endpoints_together() {
        let mut nodes = vec![node("a", 0.0, 0.0), node("b", 300.0, 0.0)];
        let links = vec![GraphLink {
            source: 0,
            target: 1,
            relation_type: "partner".into(),
            distance: None,
            strength: None,
            degree_strength: 1.0,
            bias: 0.5,
        }];
        run(Force::Link(LinkForce::default()), &mut nodes, &links);

        assert!(nodes[0].velocity.x > 0.0);
        assert!(nodes[1].velocity.x < 0.0);
    }

    #[test]
    fn collide_separates_overlapping_nodes() {
        let mut nodes = vec![node("a", 0.0, 0.0), node("b", 2.0, 0.0)];
        run(Force::Collide(CollideForce::default()), &mut nodes, &[]);

        assert!(nodes[0].velocity.x < 0.0);
        assert!(nodes[1].velocity.x > 0.0);
    }

    #[test]
    fn collide_ignores_distant_nodes() {
        let mut nodes = vec![node("a", 0.0, 0.0), node("b", 500.0, 0.0)];
        run(Force::Collide(CollideForce::default()), &mut nodes, &[]);

        assert_eq!(nodes[0].velocity, Vec2::ZERO);
        assert_eq!(nodes[1].velocity, Vec2::ZERO);
    }
}
