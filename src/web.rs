use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::net::http::Request;
use gloo::timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement, UrlSearchParams, Window};

use crate::client::{MoveClient, Transport, TransportError, game_url};
use crate::config::ClientConfig;
use crate::game_id::{self, GameId};
use crate::session::GameSession;
use crate::types::{Coordinate, HttpReply, MoveRequest, Piece};
use crate::view::{BoardView, Notice};

const PIECE_CLASS: &str = "piece";
const SQUARE_CLASS: &str = "square";
const IDLE_SQUARE: &str = "gray";
const FOCUSED_SQUARE: &str = "brown";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

struct App {
    session: Rc<RefCell<GameSession<DomBoardView>>>,
    client: Rc<MoveClient<GlooTransport>>,
}

/// Board drawn into the page: each square is an element with id `"{row}{col}"`
/// holding an `img.square` background and, when occupied, an `img.piece`.
pub struct DomBoardView {
    document: Document,
    loader_id: String,
    notice_delay_ms: u32,
}

impl DomBoardView {
    pub fn new(document: Document, config: &ClientConfig) -> Self {
        Self {
            document,
            loader_id: config.loader_id.clone(),
            notice_delay_ms: config.notice_delay_ms,
        }
    }

    fn square(&self, at: Coordinate) -> Option<Element> {
        let square = self.document.get_element_by_id(&at.square_id());
        if square.is_none() {
            log::warn!("square #{} is missing from the page", at.square_id());
        }
        square
    }

    fn remove_all(element: &Element) {
        let pieces = element.get_elements_by_class_name(PIECE_CLASS);
        // live collection: shrinks as images are removed
        while let Some(piece) = pieces.item(0) {
            piece.remove();
        }
    }

    fn piece_image(&self, piece: Piece) -> Result<Element, JsValue> {
        let img = self.document.create_element("img")?;
        img.set_class_name(PIECE_CLASS);
        img.set_attribute("src", &piece.image_src())?;
        img.set_attribute("alt", &format!("{:?}", piece.kind).to_lowercase())?;
        Ok(img)
    }
}

impl BoardView for DomBoardView {
    fn piece(&self, at: Coordinate) -> Option<Piece> {
        let img = self.square(at)?.get_elements_by_class_name(PIECE_CLASS).item(0)?;
        Piece::from_image_src(&img.get_attribute("src")?)
    }

    fn place_piece(&mut self, at: Coordinate, piece: Piece) {
        let Some(square) = self.square(at) else {
            return;
        };
        let placed = self
            .piece_image(piece)
            .and_then(|img| square.prepend_with_node_1(&img));
        if let Err(err) = placed {
            log::warn!("could not draw piece on {}: {err:?}", at.square_id());
        }
    }

    fn remove_piece(&mut self, at: Coordinate) {
        if let Some(square) = self.square(at) {
            Self::remove_all(&square);
        }
    }

    fn clear_pieces(&mut self) {
        if let Some(root) = self.document.document_element() {
            Self::remove_all(&root);
        }
    }

    fn set_highlight(&mut self, at: Coordinate, on: bool) {
        let Some(background) = self
            .square(at)
            .and_then(|square| square.get_elements_by_class_name(SQUARE_CLASS).item(0))
        else {
            return;
        };
        let Some(src) = background.get_attribute("src") else {
            return;
        };
        let next = if on {
            src.replace(IDLE_SQUARE, FOCUSED_SQUARE)
        } else {
            src.replace(FOCUSED_SQUARE, IDLE_SQUARE)
        };
        if let Err(err) = background.set_attribute("src", &next) {
            log::warn!("could not update square {}: {err:?}", at.square_id());
        }
    }

    fn set_busy(&mut self, busy: bool) {
        let Some(loader) = self
            .document
            .get_element_by_id(&self.loader_id)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let visibility = if busy { "visible" } else { "hidden" };
        if let Err(err) = loader.style().set_property("visibility", visibility) {
            log::warn!("could not toggle busy indicator: {err:?}");
        }
    }

    fn notify(&mut self, notice: Notice) {
        let message = notice.message().to_string();
        if notice.is_deferred() {
            Timeout::new(self.notice_delay_ms, move || gloo::dialogs::alert(&message)).forget();
        } else {
            gloo::dialogs::alert(&message);
        }
    }
}

/// `fetch`-backed transport.
pub struct GlooTransport {
    endpoint: String,
}

impl GlooTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Transport for GlooTransport {
    async fn fetch_board(&self, game: &GameId) -> Result<HttpReply, TransportError> {
        let response = Request::get(&game_url(&self.endpoint, game))
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        read_reply(response).await
    }

    async fn post_move(&self, game: &GameId, request: &MoveRequest) -> Result<HttpReply, TransportError> {
        let body = serde_json::to_string(request).map_err(|err| TransportError::Request(err.to_string()))?;
        let response = Request::post(&game_url(&self.endpoint, game))
            .header("Content-Type", JSON_CONTENT_TYPE)
            .body(body)
            .map_err(|err| TransportError::Request(err.to_string()))?
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        read_reply(response).await
    }
}

async fn read_reply(response: gloo::net::http::Response) -> Result<HttpReply, TransportError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| TransportError::Network(err.to_string()))?;
    Ok(HttpReply { status, body })
}

fn write_game_id(window: &Window, params: &UrlSearchParams, game_id: &GameId) -> Result<(), JsValue> {
    params.set("id", game_id.as_str());
    let location = window.location();
    let url = format!("{}?{}", location.pathname()?, String::from(params.to_string()));
    window.history()?.replace_state_with_url(&JsValue::NULL, "", Some(&url))
}

fn clicked_square(event: &web_sys::Event) -> Option<Coordinate> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    if !target.tag_name().eq_ignore_ascii_case("img") {
        return None;
    }
    Coordinate::from_square_id(&target.parent_element()?.id())
}

/// Boots the client: resolves the game id, wires the board and loads it.
#[wasm_bindgen]
pub fn start_client() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    if APP.with(|slot| slot.borrow().is_some()) {
        log::warn!("client already started");
        return Ok(());
    }

    let window = gloo::utils::window();
    let params = UrlSearchParams::new_with_str(&window.location().search()?)?;
    let config = ClientConfig::default().with_endpoint(params.get("endpoint").as_deref());
    let boot = game_id::resolve(params.get("id").as_deref());
    if boot.rewrite_url {
        write_game_id(&window, &params, &boot.game_id)?;
    }
    log::info!("game {} against {}", boot.game_id, config.endpoint);

    let document = gloo::utils::document();
    let container = document
        .get_element_by_id(&config.container_id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{}", config.container_id)))?;

    let session = Rc::new(RefCell::new(GameSession::new(
        DomBoardView::new(document, &config),
        config.player,
    )));
    let client = Rc::new(MoveClient::new(
        GlooTransport::new(config.endpoint.clone()),
        boot.game_id,
    ));

    let listener_session = Rc::clone(&session);
    let listener_client = Rc::clone(&client);
    EventListener::new(&container, "click", move |event| {
        let Some(at) = clicked_square(event) else {
            return;
        };
        let session = Rc::clone(&listener_session);
        let client = Rc::clone(&listener_client);
        spawn_local(async move {
            client.click(&session, at).await;
        });
    })
    .forget();

    APP.with(|slot| {
        *slot.borrow_mut() = Some(App {
            session: Rc::clone(&session),
            client: Rc::clone(&client),
        });
    });

    spawn_local(async move {
        client.load(&session).await;
    });
    Ok(())
}

/// Refetches the board, dropping any reply still owed to an earlier move.
#[wasm_bindgen]
pub fn reload_board() {
    let Some((session, client)) = APP.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|app| (Rc::clone(&app.session), Rc::clone(&app.client)))
    }) else {
        log::warn!("reload requested before start");
        return;
    };
    spawn_local(async move {
        client.load(&session).await;
    });
}

/// Current session state, or `null` before start.
#[wasm_bindgen]
pub fn session_state() -> Result<JsValue, JsValue> {
    let state = APP.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|app| app.session.borrow().state(app.client.game_id().as_str()))
    });
    match state {
        Some(state) => serde_wasm_bindgen::to_value(&state).map_err(JsValue::from),
        None => Ok(JsValue::NULL),
    }
}
