// Integration tests for the reach-food and patrol planners
//
// Plans produced by the search are replayed through the world model to make
// sure they land where they claim without hitting anything.

use snake_agents::agents::{Agent, SmartAgent};
use snake_agents::problem::{patrol_targets, Problem, ReachFood, ReachTarget};
use snake_agents::search::{search, search_iterations};
use snake_agents::session::Session;
use snake_agents::types::{Coord, Direction};
use snake_agents::world::WorldState;

fn straight_snake(size: i32, head: Coord, heading: Direction, food: Option<Coord>) -> WorldState {
    let back = heading.opposite();
    let second = back.apply(&head);
    let third = back.apply(&second);
    WorldState::new(size, vec![head, second, third], heading, food).unwrap()
}

fn replay(world: &WorldState, plan: &[Direction]) -> WorldState {
    let mut world = world.clone();
    for action in plan {
        world.step(*action);
        assert!(!world.check_collision(), "plan collides at {}", world.head());
    }
    world
}

#[test]
fn test_reach_food_on_open_board() {
    let world = straight_snake(8, Coord::new(2, 2), Direction::Right, Some(Coord::new(5, 2)));
    let plan = search(&ReachFood::new(&world));

    assert_eq!(plan, vec![Direction::Right, Direction::Right, Direction::Right]);
    assert_eq!(replay(&world, &plan).head(), Coord::new(5, 2));
}

#[test]
fn test_reach_food_behind_the_snake() {
    let world = straight_snake(8, Coord::new(4, 4), Direction::Right, Some(Coord::new(1, 4)));
    let plan = search(&ReachFood::new(&world));

    // The body blocks the straight line, so the detour costs two extra moves
    assert_eq!(plan.len(), 5);
    let end = replay(&world, &plan);
    assert_eq!(end.head(), Coord::new(1, 4));
    assert_eq!(end.body().len(), 4);
}

#[test]
fn test_plan_length_is_manhattan_distance_everywhere() {
    let world = straight_snake(8, Coord::new(3, 3), Direction::Up, None);

    for food in world.empty_cells() {
        let mut target = world.clone();
        target.set_food(Some(food));
        let plan = search(&ReachFood::new(&target));
        let end = replay(&target, &plan);

        assert_eq!(end.head(), food);
        // Cells straight behind the head need a U-turn around the body
        let direct = world.head().manhattan(&food) as usize;
        assert!(plan.len() == direct || plan.len() == direct + 2);
        if food.x != 3 || food.y < 3 {
            assert_eq!(plan.len(), direct, "detour to {}", food);
        }
    }
}

#[test]
fn test_anytime_search_returns_partial_plan() {
    let world = straight_snake(10, Coord::new(2, 2), Direction::Right, Some(Coord::new(8, 8)));
    let problem = ReachFood::new(&world);

    let partial = search_iterations(&problem, 3);
    let full = search(&problem);

    assert!(!partial.is_empty());
    assert!(partial.len() < full.len());
    assert_eq!(full.len(), 12);
    replay(&world, &partial);
}

#[test]
fn test_patrol_visits_every_target_in_turn() {
    let world = straight_snake(6, Coord::new(2, 3), Direction::Up, None);
    let mut problem = ReachTarget::new(&world);
    let targets = problem.targets().to_vec();
    assert_eq!(targets, patrol_targets(5));

    let mut live = world;
    for expected in targets.iter().chain(targets.iter().take(2)) {
        problem.reset(&live);
        assert_eq!(problem.target(), *expected);

        let plan = search(&problem);
        live = replay(&live, &plan);
        assert_eq!(live.head(), *expected);
    }
}

#[test]
fn test_smart_agent_scores_in_a_session() {
    let mut session = Session::new(8, Some(11)).unwrap();
    let mut agent = SmartAgent::new(Some(11));

    let summary = session.run_episode(&mut agent, 300);
    assert!(summary.score >= 1, "smart agent ate nothing: {:?}", summary);
    assert_eq!(agent.name(), "smart");
}
