//! Render stage: paints a session onto any 2D surface
//!
//! The core never sizes windows or owns pixels. It issues drawing calls in
//! logical playfield units against a [`Surface`] and the host maps those onto
//! whatever it displays.

use crate::assets::{Assets, Sprite};
use crate::store::CachedScores;

use super::input::key_hint;
use super::physics::{Actor, ActorColor};
use super::session::{MatchSession, MatchState};

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const fn from_hex(hex: u32) -> Self {
        Self((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

pub mod palette {
    use super::Color;

    pub const SKY: Color = Color::from_hex(0x70c5ce);
    pub const GROUND: Color = Color::from_hex(0xded895);
    pub const PIPE: Color = Color::from_hex(0x228b22);
    pub const PIPE_CAP: Color = Color::from_hex(0x196619);
    pub const TEXT: Color = Color::from_hex(0x222222);
    pub const WHITE: Color = Color::from_hex(0xffffff);
    pub const ACCENT: Color = Color::from_hex(0xffe600);
    pub const ACTOR_YELLOW: Color = Color::from_hex(0xffdf00);
    pub const ACTOR_CORAL: Color = Color::from_hex(0xff6b6b);
}

/// Height of the darker band at each gap edge
pub const CAP_HEIGHT: f32 = 20.0;

/// Horizontal anchoring of text relative to its x
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub outline: Option<Color>,
    pub align: Align,
}

impl TextStyle {
    pub const fn centered(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            outline: None,
            align: Align::Center,
        }
    }

    pub const fn outlined(self, outline: Color) -> Self {
        Self {
            outline: Some(outline),
            ..self
        }
    }
}

/// Drawing primitives in logical playfield units
pub trait Surface {
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color);
    /// Draw a sprite centered on (cx, cy), rotated clockwise by `angle_deg`
    fn draw_sprite(&mut self, sprite: &Sprite, cx: f32, cy: f32, w: f32, h: f32, angle_deg: f32);
    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle);
}

/// A surface that can be flushed to a display
pub trait RenderTarget: Surface {
    fn present(&mut self) -> Result<(), DisplayError>;

    /// The display area changed, in host units
    fn resize(&mut self, _cols: u16, _rows: u16) {}
}

/// Display errors
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted score context shown on the ground strip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hud {
    pub best: Option<u32>,
    /// Most recent first
    pub history: Vec<u32>,
}

impl From<CachedScores> for Hud {
    fn from(scores: CachedScores) -> Self {
        Self {
            best: scores.best,
            history: scores.history,
        }
    }
}

/// Entries of the history line
pub const HUD_HISTORY_LEN: usize = 5;

impl Hud {
    pub fn best_line(&self) -> String {
        match self.best {
            Some(best) => format!("Best: {}", best),
            None => "Best: -".to_string(),
        }
    }

    pub fn history_line(&self) -> Option<String> {
        if self.history.is_empty() {
            return None;
        }
        let recent: Vec<String> = self
            .history
            .iter()
            .take(HUD_HISTORY_LEN)
            .map(|s| s.to_string())
            .collect();
        Some(format!("Recent: {}", recent.join(" ")))
    }
}

/// Largest rect with the sprite's aspect ratio that fits the area, centered
pub fn contain_fit(aspect: f32, area_w: f32, area_h: f32) -> (f32, f32, f32, f32) {
    let area_aspect = area_w / area_h;
    if aspect > area_aspect {
        let h = area_w / aspect;
        (0.0, (area_h - h) / 2.0, area_w, h)
    } else {
        let w = area_h * aspect;
        ((area_w - w) / 2.0, 0.0, w, area_h)
    }
}

/// Visual tilt of an actor in degrees
pub fn actor_angle(actor: &Actor, state: MatchState) -> f32 {
    match state {
        MatchState::Ready => 0.0,
        MatchState::GameOver => 90.0,
        MatchState::Playing if !actor.alive => 90.0,
        MatchState::Playing => (actor.vel_y * 4.0).clamp(-30.0, 90.0),
    }
}

fn actor_color(color: ActorColor) -> Color {
    match color {
        ActorColor::Yellow => palette::ACTOR_YELLOW,
        ActorColor::Coral => palette::ACTOR_CORAL,
    }
}

/// Paint one frame
pub fn render_frame(session: &MatchSession, assets: &Assets, hud: &Hud, surface: &mut dyn Surface) {
    let field = session.field();
    let (w, h) = (field.width, field.height);
    let ground_y = field.ground_y();

    surface.clear(palette::SKY);
    if let Some(bg) = assets.background.ready() {
        let (x, y, bw, bh) = contain_fit(bg.aspect(), w, h);
        surface.draw_sprite(bg, x + bw / 2.0, y + bh / 2.0, bw, bh, 0.0);
    }

    let pipe_w = session.obstacle_stats().width;
    for obstacle in session.obstacles() {
        let bottom = obstacle.gap_bottom();
        surface.fill_rect(obstacle.x, 0.0, pipe_w, obstacle.gap_top, palette::PIPE);
        surface.fill_rect(obstacle.x, obstacle.gap_top - CAP_HEIGHT, pipe_w, CAP_HEIGHT, palette::PIPE_CAP);
        surface.fill_rect(obstacle.x, bottom, pipe_w, ground_y - bottom, palette::PIPE);
        surface.fill_rect(obstacle.x, bottom, pipe_w, CAP_HEIGHT, palette::PIPE_CAP);
    }

    surface.fill_rect(0.0, ground_y, w, field.ground_height, palette::GROUND);

    let size = field.actor_size;
    for actor in session.actors() {
        let angle = actor_angle(actor, session.state());
        match assets.actor.ready() {
            Some(sprite) => surface.draw_sprite(sprite, actor.x, actor.y, size, size, angle),
            None => surface.fill_circle(actor.x, actor.y, size / 2.0, actor_color(actor.color)),
        }
    }

    surface.draw_text(
        &session.score().to_string(),
        w / 2.0,
        80.0,
        &TextStyle::centered(36.0, palette::TEXT),
    );

    let hud_style = TextStyle {
        size: 14.0,
        color: palette::TEXT,
        outline: None,
        align: Align::Left,
    };
    surface.draw_text(&hud.best_line(), 8.0, ground_y + 16.0, &hud_style);
    if let Some(line) = hud.history_line() {
        surface.draw_text(&line, 8.0, ground_y + 36.0, &hud_style);
    }

    let hint = key_hint(session.mode());
    match session.state() {
        MatchState::Ready => {
            surface.draw_text("Flappy Bird", w / 2.0, h / 2.0 - 40.0, &TextStyle::centered(28.0, palette::TEXT));
            surface.draw_text(
                &format!("Press {} to start", hint),
                w / 2.0,
                h / 2.0,
                &TextStyle::centered(20.0, palette::WHITE).outlined(palette::TEXT),
            );
        }
        MatchState::GameOver => {
            surface.draw_text(
                "Game Over",
                w / 2.0,
                h / 2.0 - 50.0,
                &TextStyle::centered(44.0, palette::ACCENT).outlined(palette::TEXT),
            );
            surface.draw_text(
                &format!("Score: {}", session.show_score()),
                w / 2.0,
                h / 2.0,
                &TextStyle::centered(24.0, palette::WHITE).outlined(palette::TEXT),
            );
            surface.draw_text(
                &format!("Press {} to play again", hint),
                w / 2.0,
                h / 2.0 + 40.0,
                &TextStyle::centered(18.0, palette::WHITE).outlined(palette::TEXT),
            );
        }
        MatchState::Playing => {}
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::LoadState;
    use crate::game::physics::Difficulty;
    use crate::game::PlayMode;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Clear(Color),
        Rect(f32, f32, f32, f32, Color),
        Circle(f32, f32, f32, Color),
        Sprite(f32, f32, f32, f32, f32),
        Text(String),
    }

    /// Records every drawing call
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub calls: Vec<Call>,
        pub presented: usize,
    }

    impl RecordingSurface {
        pub fn texts(&self) -> Vec<&str> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Text(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self, color: Color) {
            self.calls.push(Call::Clear(color));
        }

        fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
            self.calls.push(Call::Rect(x, y, w, h, color));
        }

        fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
            self.calls.push(Call::Circle(cx, cy, radius, color));
        }

        fn draw_sprite(&mut self, _sprite: &Sprite, cx: f32, cy: f32, w: f32, h: f32, angle_deg: f32) {
            self.calls.push(Call::Sprite(cx, cy, w, h, angle_deg));
        }

        fn draw_text(&mut self, text: &str, _x: f32, _y: f32, _style: &TextStyle) {
            self.calls.push(Call::Text(text.to_string()));
        }
    }

    impl RenderTarget for RecordingSurface {
        fn present(&mut self) -> Result<(), DisplayError> {
            self.presented += 1;
            Ok(())
        }
    }

    #[test]
    fn ready_frame_uses_fallback_shapes_and_prompt() {
        let session = MatchSession::new(PlayMode::Solo, Difficulty::Normal, 1).unwrap();
        let mut surface = RecordingSurface::default();
        render_frame(&session, &Assets::default(), &Hud::default(), &mut surface);

        assert_eq!(surface.calls[0], Call::Clear(palette::SKY));
        assert!(surface
            .calls
            .contains(&Call::Rect(0.0, 550.0, 400.0, 50.0, palette::GROUND)));
        assert!(surface
            .calls
            .contains(&Call::Circle(100.0, 300.0, 32.5, palette::ACTOR_YELLOW)));

        let texts = surface.texts();
        assert!(texts.contains(&"0"));
        assert!(texts.contains(&"Best: -"));
        assert!(texts.contains(&"Press [Space] or [Up] to start"));
    }

    #[test]
    fn duo_actors_use_slot_colors() {
        let session = MatchSession::new(PlayMode::Duo, Difficulty::Normal, 1).unwrap();
        let mut surface = RecordingSurface::default();
        render_frame(&session, &Assets::default(), &Hud::default(), &mut surface);

        assert!(surface
            .calls
            .contains(&Call::Circle(80.0, 300.0, 32.5, palette::ACTOR_CORAL)));
        assert!(surface.texts().iter().any(|t| t.contains("P2 [Up]/[Enter]")));
    }

    #[test]
    fn game_over_overlay_shows_frozen_score_and_history() {
        let mut session = MatchSession::new(PlayMode::Solo, Difficulty::Normal, 1).unwrap();
        session.start();
        while session.is_playing() {
            session.tick(1.0);
        }

        let hud = Hud {
            best: Some(12),
            history: vec![0, 4, 12, 1, 2, 3, 9],
        };
        let mut surface = RecordingSurface::default();
        render_frame(&session, &Assets::default(), &hud, &mut surface);

        let texts = surface.texts();
        assert!(texts.contains(&"Game Over"));
        assert!(texts.contains(&"Score: 0"));
        assert!(texts.contains(&"Best: 12"));
        assert!(texts.contains(&"Recent: 0 4 12 1 2"));
    }

    #[test]
    fn loaded_sprite_replaces_the_circle_and_tilts() {
        let mut session = MatchSession::new(PlayMode::Solo, Difficulty::Normal, 1).unwrap();
        let sprite = Sprite::parse_ppm(b"P3 1 1 255 1 1 1").unwrap();
        let assets = Assets {
            actor: LoadState::Loaded(sprite),
            background: LoadState::Failed("missing".to_string()),
        };
        session.start();
        session.primary_action(0);

        let mut surface = RecordingSurface::default();
        render_frame(&session, &assets, &Hud::default(), &mut surface);

        assert!(!surface.calls.iter().any(|c| matches!(c, Call::Circle(..))));
        assert!(surface
            .calls
            .contains(&Call::Sprite(100.0, 300.0, 65.0, 65.0, -30.0)));
    }

    #[test]
    fn tilt_follows_state() {
        let field = crate::game::field::Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        actor.vel_y = 5.0;
        assert_eq!(actor_angle(&actor, MatchState::Ready), 0.0);
        assert_eq!(actor_angle(&actor, MatchState::Playing), 20.0);
        assert_eq!(actor_angle(&actor, MatchState::GameOver), 90.0);
        actor.vel_y = 40.0;
        assert_eq!(actor_angle(&actor, MatchState::Playing), 90.0);
        actor.alive = false;
        actor.vel_y = 0.0;
        assert_eq!(actor_angle(&actor, MatchState::Playing), 90.0);
    }

    #[test]
    fn contain_fit_letterboxes() {
        // Wide image in a tall area
        assert_eq!(contain_fit(2.0, 400.0, 600.0), (0.0, 200.0, 400.0, 200.0));
        // Tall image in a tall area
        assert_eq!(contain_fit(0.5, 400.0, 600.0), (50.0, 0.0, 300.0, 600.0));
    }

    #[test]
    fn obstacles_draw_bars_and_caps() {
        let mut session = MatchSession::new(PlayMode::Solo, Difficulty::Normal, 1).unwrap();
        session.start();
        // Hover until the first obstacle appears
        while session.obstacles().is_empty() {
            session.primary_action(0);
            session.tick(1.0);
        }
        let obstacle = session.obstacles()[0].clone();

        let mut surface = RecordingSurface::default();
        render_frame(&session, &Assets::default(), &Hud::default(), &mut surface);
        assert!(surface.calls.contains(&Call::Rect(
            obstacle.x,
            obstacle.gap_top - CAP_HEIGHT,
            60.0,
            CAP_HEIGHT,
            palette::PIPE_CAP
        )));
        assert!(surface.calls.contains(&Call::Rect(
            obstacle.x,
            obstacle.gap_bottom(),
            60.0,
            550.0 - obstacle.gap_bottom(),
            palette::PIPE
        )));
    }
}
