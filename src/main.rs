//! Chihuahua Run entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, HtmlCanvasElement, MouseEvent, TouchEvent};

    use chihuahua_run::highscores::{NoRemote, RankingSink};
    use chihuahua_run::inventory::ItemKind;
    use chihuahua_run::persistence::{KeyValueStore, LocalStorage, MemoryStore, StoreError};
    use chihuahua_run::platform::{self, FpsCounter, InputAction};
    use chihuahua_run::rewards::{ClaimResult, ClaimStatus};
    use chihuahua_run::sim::{GamePhase, RunMode, ScoreEntry, TickInput};
    use chihuahua_run::{Session, Tuning};

    // JS bindings for the scene graph, remote rankings and the wallet
    #[wasm_bindgen(inline_js = "
        export function publish_frame(json) {
            if (window.chihuahuaScene && window.chihuahuaScene.update) {
                window.chihuahuaScene.update(JSON.parse(json));
            }
        }

        export function push_ranking(json) {
            if (window.chihuahuaRankings && window.chihuahuaRankings.push) {
                Promise.resolve(window.chihuahuaRankings.push(JSON.parse(json)))
                    .catch(e => console.warn('Ranking push failed:', e));
                return true;
            }
            return false;
        }

        export function load_tuning() {
            const el = document.getElementById('tuning');
            return el ? el.textContent : null;
        }

        export async function claim_reward(wallet, score) {
            const w = window.chihuahuaWallet;
            if (!w || !w.claimReward) {
                throw new Error('wallet unavailable');
            }
            const r = await w.claimReward(wallet, score);
            return JSON.stringify({
                success: !!r.success,
                message: String(r.message || ''),
                tx_hash: r.txHash || null,
            });
        }
    ")]
    extern "C" {
        fn publish_frame(json: &str);
        fn push_ranking(json: &str) -> bool;
        fn load_tuning() -> Option<String>;
        #[wasm_bindgen(catch)]
        fn claim_reward(wallet: &str, score: f64) -> Result<js_sys::Promise, JsValue>;
    }

    /// Remote ranking store reached through page JS
    struct JsRankings;

    impl RankingSink for JsRankings {
        fn push(&mut self, entry: &ScoreEntry) -> Result<(), StoreError> {
            let json = serde_json::to_string(entry).map_err(|source| StoreError::Json {
                key: "ranking".into(),
                source,
            })?;
            if push_ranking(&json) {
                Ok(())
            } else {
                Err(StoreError::Unavailable)
            }
        }
    }

    /// Game wrapper for WASM
    struct Game {
        session: Session,
        last_time: f64,
        input: TickInput,
        fps: FpsCounter,
        last_phase: GamePhase,
    }

    impl Game {
        fn new(session: Session) -> Self {
            let last_phase = session.phase();
            Self {
                session,
                last_time: 0.0,
                input: TickInput::default(),
                fps: FpsCounter::new(),
                last_phase,
            }
        }

        fn apply(&mut self, action: InputAction) {
            match action {
                InputAction::Dodge => self.input.dodge = true,
                InputAction::Duck => self.input.duck = true,
                InputAction::Pause => self.input.pause = true,
                InputAction::Start => {
                    self.session.start(RunMode::Normal);
                }
                InputAction::StartDemo => {
                    self.session.start(RunMode::Demo);
                }
            }
        }

        /// Run one simulation frame
        fn update(&mut self, dt: f32, time: f64) {
            let input = std::mem::take(&mut self.input);
            self.session.frame(&input, dt);
            self.fps.record(time);
        }

        /// Hand the frame to the scene graph
        fn render(&self) {
            match serde_json::to_string(&self.session.snapshot()) {
                Ok(json) => publish_frame(&json),
                Err(e) => log::warn!("Snapshot encode failed: {}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self, document: &Document) {
            let snap = self.session.snapshot();

            set_text(document, "#hud-score .hud-value", &snap.run.score.to_string());
            set_text(document, "#hud-distance .hud-value", &format!("{:.0}m", snap.run.distance));
            set_text(document, "#hud-lives .hud-value", &format!("{:.1}", snap.run.lives));
            set_text(
                document,
                "#hud-treats .hud-value",
                &self.session.inventory().quantity(ItemKind::Treat).to_string(),
            );

            if self.session.settings().show_fps {
                set_text(document, "#hud-fps .hud-value", &self.fps.fps().to_string());
            }

            show(document, "hud-combo", snap.run.combo > 1);
            set_text(document, "#hud-combo .hud-value", &snap.run.combo.to_string());

            let cut_in = snap
                .cut_in
                .as_ref()
                .filter(|_| self.session.settings().effective_cut_ins());
            show(document, "cut-in", cut_in.is_some());
            if let Some(cut_in) = cut_in {
                set_text(document, "#cut-in", &cut_in.text);
            }

            // Screens only change on phase transitions
            let phase = snap.phase;
            if phase != self.last_phase {
                show(document, "title-screen", phase == GamePhase::Title);
                show(document, "history-screen", phase == GamePhase::History);
                show(document, "ranking-screen", phase == GamePhase::Ranking);
                show(document, "pause-menu", phase == GamePhase::Paused);
                show(document, "game-clear", phase == GamePhase::GameClear);
                show(document, "game-over", phase == GamePhase::GameOver);
                if phase == GamePhase::GameOver {
                    set_text(document, "#final-score", &snap.run.score.to_string());
                    set_text(document, "#final-distance", &format!("{:.0}m", snap.run.distance));
                    let rank = match self.session.last_rank() {
                        Some(rank) => format!("Rank #{}", rank),
                        None => String::new(),
                    };
                    set_text(document, "#final-rank", &rank);
                }
                if phase == GamePhase::History {
                    self.fill_history(document);
                }
                if phase == GamePhase::Ranking {
                    self.fill_rankings(document);
                }
                self.last_phase = phase;
            }

            let claim_text = match self.session.claim_status() {
                ClaimStatus::Idle => String::new(),
                ClaimStatus::Pending(_) => "Claiming...".to_string(),
                ClaimStatus::Finished(result) => result.message.clone(),
            };
            set_text(document, "#claim-status", &claim_text);
        }

        fn fill_history(&self, document: &Document) {
            let best = match self.session.history().best() {
                Some(e) => format!("Best: {}  {:.0}m", e.score, e.distance),
                None => "No runs yet".to_string(),
            };
            set_text(document, "#history-best", &best);

            let rows: Vec<String> = self
                .session
                .history()
                .entries
                .iter()
                .map(|e| format!("{}  {}  {:.0}m", e.date.format("%Y-%m-%d %H:%M"), e.score, e.distance))
                .collect();
            set_text(document, "#history-list", &rows.join("\n"));
        }

        fn fill_rankings(&self, document: &Document) {
            let rows: Vec<String> = self
                .session
                .rankings()
                .entries
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    let name = e.username.as_deref().unwrap_or("guest");
                    format!("{:>2}. {}  {}", i + 1, name, e.score)
                })
                .collect();
            set_text(document, "#ranking-list", &rows.join("\n"));
        }
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    fn open_store() -> Box<dyn KeyValueStore> {
        match LocalStorage::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{}; progress will not be saved", e);
                Box::new(MemoryStore::new())
            }
        }
    }

    fn load_tuning_overrides() -> Tuning {
        let Some(json) = load_tuning() else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Invalid tuning overrides, using defaults: {}", e);
                Tuning::default()
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Chihuahua Run starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let seed = platform::clock_seed();
        let sink: Box<dyn RankingSink> = if window.get("chihuahuaRankings").is_some() {
            Box::new(JsRankings)
        } else {
            Box::new(NoRemote)
        };
        let session = Session::new(seed, load_tuning_overrides(), open_store(), sink);
        let game = Rc::new(RefCell::new(Game::new(session)));

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_menu_buttons(game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Chihuahua Run running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse click: dodge in the upper screen, duck in the lower
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let w = canvas_clone.client_width() as f32;
                let h = canvas_clone.client_height() as f32;
                let pos = platform::normalize_pointer(event.offset_x() as f32, event.offset_y() as f32, w, h);
                pointer_input(&mut game.borrow_mut(), pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    let y = touch.client_y() as f32 - rect.top() as f32;
                    let pos = platform::normalize_pointer(x, y, rect.width() as f32, rect.height() as f32);
                    pointer_input(&mut game.borrow_mut(), pos);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let window = web_sys::window().expect("no window");
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                if let Some(action) = platform::map_key(&event.key()) {
                    event.prevent_default();
                    game.borrow_mut().apply(action);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn pointer_input(game: &mut Game, pos: Option<glam::Vec2>) {
        if game.session.phase().can_start_run() {
            game.apply(InputAction::Start);
            return;
        }
        if let Some(pos) = pos {
            game.apply(platform::pointer_action(pos));
            game.input.pointer = Some(pos);
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            g.update_hud(&document);
        }

        request_animation_frame(game);
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(MouseEvent) + 'static) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(handler);
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_menu_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        {
            let game = game.clone();
            on_click(&document, "start-btn", move |_| game.borrow_mut().apply(InputAction::Start));
        }
        {
            let game = game.clone();
            on_click(&document, "restart-btn", move |_| game.borrow_mut().apply(InputAction::Start));
        }
        {
            let game = game.clone();
            on_click(&document, "demo-btn", move |_| game.borrow_mut().apply(InputAction::StartDemo));
        }
        {
            let game = game.clone();
            on_click(&document, "resume-btn", move |_| game.borrow_mut().apply(InputAction::Pause));
        }
        {
            let game = game.clone();
            on_click(&document, "history-btn", move |_| {
                game.borrow_mut().session.show_history();
            });
        }
        {
            let game = game.clone();
            on_click(&document, "ranking-btn", move |_| {
                game.borrow_mut().session.show_ranking();
            });
        }
        {
            let game = game.clone();
            on_click(&document, "title-btn", move |_| {
                game.borrow_mut().session.back_to_title();
            });
        }
        {
            let game = game.clone();
            on_click(&document, "treat-btn", move |_| {
                game.borrow_mut().session.use_item(ItemKind::Treat);
            });
        }
        {
            let game = game.clone();
            on_click(&document, "shield-btn", move |_| {
                game.borrow_mut().session.use_item(ItemKind::Shield);
            });
        }
        on_click(&document, "claim-btn", move |_| start_claim(game.clone()));
    }

    /// Run the wallet claim off the frame loop; the HUD polls the result
    fn start_claim(game: Rc<RefCell<Game>>) {
        let result = game.borrow_mut().session.begin_claim();
        // Rejections are already shown through the claim status
        let Ok(request) = result else {
            return;
        };

        wasm_bindgen_futures::spawn_local(async move {
            let outcome = match claim_reward(&request.wallet, request.score as f64) {
                Ok(promise) => match JsFuture::from(promise).await {
                    Ok(value) => value
                        .as_string()
                        .ok_or_else(|| "invalid wallet response".to_string())
                        .and_then(|json| {
                            serde_json::from_str::<ClaimResult>(&json).map_err(|e| e.to_string())
                        }),
                    Err(e) => Err(e.as_string().unwrap_or_else(|| "wallet call failed".into())),
                },
                Err(e) => Err(e.as_string().unwrap_or_else(|| "wallet unavailable".into())),
            };
            game.borrow_mut().session.finish_claim(outcome);
        });
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden
                    && game.borrow_mut().session.auto_pause()
                {
                    log::info!("Auto-paused (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.session.settings().mute_on_blur && g.session.auto_pause() {
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Chihuahua Run (native) starting...");
    log::info!("The game runs in the browser - build for wasm32 and serve with `trunk serve`");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| chihuahua_run::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Invalid tuning file {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => chihuahua_run::Tuning::default(),
    };
    println!("{}", serde_json::to_string_pretty(&tuning).unwrap_or_default());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
