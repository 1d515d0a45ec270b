use std::collections::{HashMap, HashSet, VecDeque};

use arcturus_shared::Hyperlane;

/// Routes longer than this many hops are not worth flying; the search stops
/// expanding instead of walking the whole galaxy.
pub const MAX_ROUTE_HOPS: usize = 15;

/// True when a hyperlane joins `a` and `b` in either direction.
pub fn are_connected(lanes: &[Hyperlane], a: &str, b: &str) -> bool {
    lanes.iter().any(|lane| lane.connects(a, b))
}

/// Undirected adjacency lists from the hyperlane set. Duplicate lanes and
/// self-loops in the feed are dropped.
pub fn build_adjacency(lanes: &[Hyperlane]) -> HashMap<String, Vec<String>> {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for lane in lanes {
        if lane.from_system == lane.to_system {
            continue;
        }
        let key = if lane.from_system < lane.to_system {
            (lane.from_system.clone(), lane.to_system.clone())
        } else {
            (lane.to_system.clone(), lane.from_system.clone())
        };
        if !seen.insert(key) {
            continue;
        }
        adjacency
            .entry(lane.from_system.clone())
            .or_default()
            .push(lane.to_system.clone());
        adjacency
            .entry(lane.to_system.clone())
            .or_default()
            .push(lane.from_system.clone());
    }
    adjacency
}

/// Minimum-hop route from `start` to `goal` over the hyperlane graph, as an
/// ordered system-id list including both endpoints. BFS order guarantees the
/// fewest hops, not the shortest geometric distance. Returns `None` when the
/// target is unreachable within `MAX_ROUTE_HOPS` — the caller surfaces that
/// as "no route", it is never retried here.
pub fn find_path(
    adjacency: &HashMap<String, Vec<String>>,
    start: &str,
    goal: &str,
) -> Option<Vec<String>> {
    if start == goal {
        return Some(vec![start.to_string()]);
    }

    let mut came_from: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    came_from.insert(start, start);
    queue.push_back((start, 0));

    while let Some((id, hops)) = queue.pop_front() {
        if hops >= MAX_ROUTE_HOPS {
            continue;
        }
        let Some(neighbors) = adjacency.get(id) else {
            continue;
        };
        for neighbor in neighbors {
            if came_from.contains_key(neighbor.as_str()) {
                continue;
            }
            came_from.insert(neighbor, id);
            if neighbor == goal {
                return Some(reconstruct(&came_from, goal));
            }
            queue.push_back((neighbor, hops + 1));
        }
    }
    None
}

fn reconstruct(came_from: &HashMap<&str, &str>, goal: &str) -> Vec<String> {
    let mut path = vec![goal.to_string()];
    let mut current = goal;
    while let Some(&prev) = came_from.get(current) {
        if prev == current {
            break;
        }
        path.push(prev.to_string());
        current = prev;
    }
    path.reverse();
    path
}
