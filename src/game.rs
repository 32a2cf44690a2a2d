//! This module contains the main game logic and state.

use bevy_ecs::event::{EventRegistry, Events};
use bevy_ecs::query::With;
use bevy_ecs::schedule::{IntoScheduleConfigs, Schedule};
use bevy_ecs::world::World;
use glam::{IVec2, Vec2};
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::error::{EntityError, GameResult};
use crate::formatter;
use crate::ghost::policy::GhostPilot;
use crate::ghost::state::{GhostEnv, GhostMachine, GhostState, GhostZones};
use crate::map::direction::Direction;
use crate::map::flags::{AgentKind, TileFlags};
use crate::map::grid::Grid;
use crate::map::parser::BoardParser;
use crate::movement::stepper::AgentMotion;
use crate::movement::tween::Tweener;
use crate::player::PlayerMover;
use crate::power::PowerTimer;
use crate::systems::{
    bonus_system, contact_system, ghost_ai_system, ghost_signal_system, ghost_state_system, item_system, life_system,
    player_control_system, player_movement_system, power_system, round_system, stage_system, tween_system, Bonus,
    BonusCollected, BonusState, DeltaTime, EntityType, Frozen, GameClock, GameCommand, GameRng, GameStage, Ghost,
    GhostBundle, GhostEvent, GridCell, ItemBundle, ItemEaten, LevelSettings, PelletCount, PlayerBundle, PlayerCaught,
    PlayerControlled, PlayerLives, PowerEvent, RoundState, ScoreResource, StageChanged,
};

/// Core game state manager built on the Bevy ECS architecture.
///
/// Owns the world holding the grid, the agents and every shared resource, plus the
/// schedule that advances them one fixed tick at a time.
pub struct Game {
    pub world: World,
    pub schedule: Schedule,
    ticks: u64,
}

impl Game {
    /// Builds a level from a text board and spawns its player, ghosts and pellets.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration, an unparseable board, a level missing
    /// its walls or floor, or a missing or blocked player start.
    pub fn new<S: AsRef<str>>(board: &[S], config: GameConfig) -> GameResult<Game> {
        config.validate()?;

        debug!("Parsing board layers");
        let layers = BoardParser::parse_board(board)?;

        debug!("Building grid");
        let grid = Grid::build(&layers, config.level.transform())?;
        let zones = GhostZones::from_grid(&grid);

        let player_start = layers.player_start.ok_or(EntityError::MissingPlayerStart)?;
        if !grid.is_walkable(player_start, AgentKind::Player) {
            return Err(EntityError::InvalidStart(player_start).into());
        }

        let mut rng = match config.seed {
            Some(seed) => GameRng::seeded(seed),
            None => GameRng::from_os(),
        };

        debug!("Initializing ECS world and system schedule");
        let mut world = World::default();
        let mut schedule = Schedule::default();
        Self::setup_ecs(&mut world);
        Self::configure_schedule(&mut schedule);

        let mut tweener = Tweener::new();
        let intro = config.level.intro_duration > 0.0;

        debug!(cell = ?player_start, "Spawning player entity");
        let player = world
            .spawn(PlayerBundle {
                player: PlayerControlled,
                motion: AgentMotion::at(&grid, player_start),
                mover: PlayerMover::new(config.player.speed, player_start),
                entity_type: EntityType::Player,
            })
            .id();
        if intro {
            world.entity_mut(player).insert(Frozen);
        }

        let ghost_starts = if layers.ghost_starts.is_empty() {
            warn!("Board has no ghost starts, using the ghost house");
            zones.home.iter().copied().take(config.ghosts.len()).collect()
        } else {
            layers.ghost_starts.clone()
        };

        info!(count = ghost_starts.len(), "Spawning ghosts");
        for (index, start) in ghost_starts.into_iter().enumerate() {
            let ghost_config = config.ghost(index);
            if ghost_config.start_in_spawn && zones.exit.is_empty() {
                warn!(index, "Ghost starts in the house, but the level has no house exit");
            }

            let style = ghost_config.style.resolve(&mut rng.0);
            let base_speed = config.player.speed * ghost_config.speed_factor;
            let entity = world.spawn_empty().id();

            let mut motion = AgentMotion::at(&grid, start);
            let mut machine = GhostMachine::new(&ghost_config, base_speed, start);
            let mut env = GhostEnv {
                grid: &grid,
                zones: &zones,
                tweener: &mut tweener,
                now: 0.0,
                power_remaining: 0.0,
                recover_threshold: config.level.recover_threshold,
            };
            machine.start(&mut env, entity, &mut motion);
            if intro {
                machine.freeze(&mut tweener, entity);
            }

            debug!(index, ghost = ?entity, ?start, style = style.as_ref(), state = ?machine.state(), "Ghost spawned");
            world.entity_mut(entity).insert(GhostBundle {
                ghost: Ghost(index),
                motion,
                machine,
                pilot: GhostPilot::new(&ghost_config, style, 0.0),
                entity_type: EntityType::Ghost,
            });
        }

        let pellets = Self::spawn_items(&mut world, &grid);
        info!(pellets, "Items spawned");

        world.insert_resource(grid);
        world.insert_resource(zones);
        world.insert_resource(tweener);
        world.insert_resource(rng);
        world.insert_resource(PowerTimer::new(
            config.level.power_duration,
            config.level.recover_threshold,
        ));
        world.insert_resource(PlayerLives(config.level.starting_lives));
        world.insert_resource(ScoreResource(0));
        world.insert_resource(PelletCount(pellets));
        world.insert_resource(DeltaTime::default());
        world.insert_resource(GameClock::default());
        if intro {
            world.insert_resource(RoundState::Intro {
                remaining: config.level.intro_duration,
            });
            world.insert_resource(GameStage::Intro);
        } else {
            world.insert_resource(RoundState::Running);
            world.insert_resource(GameStage::Playing);
        }
        world.insert_resource(BonusState::Waiting {
            remaining: config.level.bonus_delay,
        });
        world.insert_resource(LevelSettings(config.level));

        info!("Game initialization completed successfully");
        Ok(Game {
            world,
            schedule,
            ticks: 0,
        })
    }

    fn setup_ecs(world: &mut World) {
        EventRegistry::register_event::<GameCommand>(world);
        EventRegistry::register_event::<GhostEvent>(world);
        EventRegistry::register_event::<PowerEvent>(world);
        EventRegistry::register_event::<ItemEaten>(world);
        EventRegistry::register_event::<PlayerCaught>(world);
        EventRegistry::register_event::<BonusCollected>(world);
        EventRegistry::register_event::<StageChanged>(world);
    }

    fn configure_schedule(schedule: &mut Schedule) {
        schedule.add_systems(
            (
                player_control_system,
                power_system,
                ghost_state_system,
                ghost_ai_system,
                player_movement_system,
                tween_system,
                item_system,
                bonus_system,
                contact_system,
                ghost_signal_system,
                life_system,
                round_system,
                stage_system,
            )
                .chain(),
        );
    }

    /// Spawns one entity per pellet and power pellet, returning how many were placed.
    fn spawn_items(world: &mut World, grid: &Grid) -> u32 {
        let mut count = 0;
        for (flag, entity_type) in [
            (TileFlags::PELLET, EntityType::Pellet),
            (TileFlags::POWER_PELLET, EntityType::PowerPellet),
        ] {
            for cell in grid.cells_with(flag) {
                world.spawn(ItemBundle {
                    cell: GridCell(cell),
                    entity_type,
                });
                count += 1;
            }
        }
        count
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// # Returns
    ///
    /// `true` once the game is over.
    pub fn tick(&mut self, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.update_events();
        let elapsed = {
            let mut clock = self.world.resource_mut::<GameClock>();
            clock.elapsed += dt;
            clock.elapsed
        };
        self.world.insert_resource(DeltaTime { seconds: dt });
        self.schedule.run(&mut self.world);

        self.ticks += 1;
        formatter::record_tick(self.ticks, elapsed);
        self.is_over()
    }

    /// Rotates every event buffer so events live for exactly one further tick.
    fn update_events(&mut self) {
        self.world.resource_mut::<Events<GameCommand>>().update();
        self.world.resource_mut::<Events<GhostEvent>>().update();
        self.world.resource_mut::<Events<PowerEvent>>().update();
        self.world.resource_mut::<Events<ItemEaten>>().update();
        self.world.resource_mut::<Events<PlayerCaught>>().update();
        self.world.resource_mut::<Events<BonusCollected>>().update();
        self.world.resource_mut::<Events<StageChanged>>().update();
    }

    /// Queues a command for the next tick.
    pub fn send_command(&mut self, command: GameCommand) {
        self.world.send_event(command);
    }

    /// Buffers a turn for the player.
    pub fn steer(&mut self, direction: Direction) {
        self.send_command(GameCommand::MovePlayer(direction));
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn elapsed(&self) -> f32 {
        self.world.resource::<GameClock>().elapsed
    }

    pub fn score(&self) -> u32 {
        self.world.resource::<ScoreResource>().0
    }

    pub fn lives(&self) -> u8 {
        self.world.resource::<PlayerLives>().0
    }

    pub fn pellets_remaining(&self) -> u32 {
        self.world.resource::<PelletCount>().0
    }

    pub fn stage(&self) -> GameStage {
        *self.world.resource::<GameStage>()
    }

    pub fn round(&self) -> RoundState {
        *self.world.resource::<RoundState>()
    }

    pub fn is_over(&self) -> bool {
        self.round().is_over()
    }

    pub fn grid(&self) -> &Grid {
        self.world.resource::<Grid>()
    }

    pub fn power_remaining(&self) -> f32 {
        self.world.resource::<PowerTimer>().remaining()
    }

    /// The player's motion, if the player exists.
    pub fn player_motion(&mut self) -> Option<AgentMotion> {
        let mut query = self.world.query_filtered::<&AgentMotion, With<PlayerControlled>>();
        query.iter(&self.world).next().copied()
    }

    pub fn player_cell(&mut self) -> Option<IVec2> {
        self.player_motion().map(|motion| motion.cell)
    }

    pub fn player_position(&mut self) -> Option<Vec2> {
        self.player_motion().map(|motion| motion.position)
    }

    /// Where the bonus is, while one is crossing the level.
    pub fn bonus_position(&mut self) -> Option<Vec2> {
        let mut query = self.world.query_filtered::<&AgentMotion, With<Bonus>>();
        query.iter(&self.world).next().map(|motion| motion.position)
    }

    /// Every ghost's state, ordered by spawn index.
    pub fn ghost_states(&mut self) -> Vec<GhostState> {
        let mut query = self.world.query::<(&Ghost, &GhostMachine)>();
        let mut ghosts: Vec<_> = query
            .iter(&self.world)
            .map(|(ghost, machine)| (ghost.0, machine.state()))
            .collect();
        ghosts.sort_by_key(|(index, _)| *index);
        ghosts.into_iter().map(|(_, state)| state).collect()
    }

    /// Every ghost's motion, ordered by spawn index.
    pub fn ghost_motions(&mut self) -> Vec<AgentMotion> {
        let mut query = self.world.query::<(&Ghost, &AgentMotion)>();
        let mut ghosts: Vec<_> = query.iter(&self.world).map(|(ghost, motion)| (ghost.0, *motion)).collect();
        ghosts.sort_by_key(|(index, _)| *index);
        ghosts.into_iter().map(|(_, motion)| motion).collect()
    }
}
