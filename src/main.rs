use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, Level};

use cell_arena_server::config::ServerConfig;
use cell_arena_server::game::constants::world as world_consts;
use cell_arena_server::game::mode::FreeForAll;
use cell_arena_server::game::world::{CellKind, Color};
use cell_arena_server::net::game_session::{start_game_loop, GameSession};
use cell_arena_server::util::vec2::Vec2;

use rand::Rng;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Cell Arena Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ServerConfig::load_or_default();
    info!(
        "Configuration loaded: sight base {}, view refresh every {} ticks, leaderboard every {} ticks",
        config.view.sight_base, config.view_refresh_period, config.leaderboard_period
    );

    let leaderboard_size = config.leaderboard_size;
    let mut arena = GameSession::new(config, Box::new(FreeForAll::new(leaderboard_size)))?;
    seed_food(&mut arena);

    let session = Arc::new(RwLock::new(arena));
    start_game_loop(session.clone());

    // Transports register clients via GameSession::join; this process hosts
    // the arena until asked to stop.
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    Ok(())
}

/// Populate the arena with its starting food cells (single-writer phase,
/// before the loop starts ticking)
fn seed_food(arena: &mut GameSession) {
    let target = arena.config().food_target;
    let border = arena.config().border;
    let mut rng = rand::thread_rng();
    for _ in 0..target {
        let position = Vec2::new(
            rng.gen_range(border.left..border.right),
            rng.gen_range(border.top..border.bottom),
        );
        let color = Color::random(&mut rng);
        arena.spawn_cell(CellKind::Food, None, position, world_consts::FOOD_MASS, color);
    }
    info!("seeded {} food cells", target);
}
