use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rust_decimal::Decimal;
use std::{str::FromStr, sync::Arc};
use tickerboard_data::{
    DataError, FavoriteSet, TickerBoard, TickerMap, TickerRecord,
    calculator::ProfitCalculation,
    feed::ConnectionStatus,
    portfolio::Portfolio,
    storage::{LocalStore, Settings, StorageKey},
    views::{QuoteFilter, ViewQuery},
};
use tracing::{info, warn};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Screen {
    Markets,
    Portfolio,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Search,
    AddPosition,
    Calculator,
}

/// Side effects the event loop performs on behalf of the [`App`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    None,
    Quit,
    Refresh,
}

/// Validated `SYMBOL AMOUNT PRICE` entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PositionForm {
    pub symbol: String,
    pub amount: Decimal,
    pub buy_price: Decimal,
}

/// Validated `ENTRY EXIT AMOUNT [FEE%]` entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CalculatorForm {
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub amount: Decimal,
    pub fee_percent: Decimal,
}

pub struct App {
    pub screen: Screen,
    pub input_mode: InputMode,
    pub input: String,
    pub query: ViewQuery,
    pub selected: usize,
    pub position_selected: usize,
    pub favorites: FavoriteSet,
    pub portfolio: Portfolio,
    pub settings: Settings,
    pub mapping: Arc<TickerMap>,
    pub last_error: Option<DataError>,
    pub live_status: ConnectionStatus,
    pub calculation: Option<(CalculatorForm, ProfitCalculation)>,
    pub message: Option<String>,
    board: Arc<TickerBoard>,
    store: LocalStore,
}

impl App {
    /// Restore persisted favourites, positions and settings, and seed the board's
    /// retention sets with them.
    pub fn new(board: Arc<TickerBoard>, store: LocalStore) -> Self {
        let favorites = store.load::<FavoriteSet>(StorageKey::Favorites);
        let portfolio = Portfolio::new(store.load_each(StorageKey::Portfolio));
        let settings = store.load::<Settings>(StorageKey::Settings);

        info!(
            favorites = favorites.len(),
            positions = portfolio.positions().len(),
            theme = ?settings.theme,
            "restored local state"
        );

        board.set_favorites(favorites.clone());
        board.set_held(portfolio.held_symbols());

        Self {
            screen: Screen::Markets,
            input_mode: InputMode::Normal,
            input: String::new(),
            query: ViewQuery::default(),
            selected: 0,
            position_selected: 0,
            favorites,
            portfolio,
            settings,
            mapping: board.mapping(),
            last_error: None,
            live_status: ConnectionStatus::Disconnected,
            calculation: None,
            message: None,
            board,
            store,
        }
    }

    /// Adopt a new [`TickerMap`] version and revalue the portfolio against it.
    pub fn sync(&mut self, mapping: Arc<TickerMap>) {
        self.mapping = mapping;
        self.portfolio.revalue(&self.mapping);
        self.clamp_selection();
    }

    /// Records shown by the markets table.
    pub fn rows(&self) -> Vec<&TickerRecord> {
        self.query.apply(&self.mapping, &self.favorites)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key.code),
            _ => {
                self.handle_input_key(key.code);
                Action::None
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::F(5) => return Action::Refresh,
            KeyCode::Tab => {
                self.screen = match self.screen {
                    Screen::Markets => Screen::Portfolio,
                    Screen::Portfolio => Screen::Markets,
                };
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char(digit @ '1'..='4') => {
                let index = digit as usize - '1' as usize;
                self.query.class = QuoteFilter::ALL[index];
                self.selected = 0;
            }
            KeyCode::Char('s') => self.query.column = self.query.column.next(),
            KeyCode::Char('r') => self.query.direction = self.query.direction.toggle(),
            KeyCode::Char('/') => self.begin_input(InputMode::Search, self.query.search.clone()),
            KeyCode::Char('f') if self.screen == Screen::Markets => self.toggle_favorite(),
            KeyCode::Char('a') => self.begin_input(InputMode::AddPosition, String::new()),
            KeyCode::Char('d') if self.screen == Screen::Portfolio => self.remove_selected_position(),
            KeyCode::Char('c') => self.begin_input(InputMode::Calculator, String::new()),
            KeyCode::Char('t') => self.toggle_theme(),
            _ => {}
        }
        Action::None
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                if self.input_mode == InputMode::Search {
                    self.query.search.clear();
                }
                self.end_input();
            }
            KeyCode::Enter => {
                match self.input_mode {
                    InputMode::AddPosition => self.submit_position(),
                    InputMode::Calculator => self.submit_calculator(),
                    InputMode::Search | InputMode::Normal => {}
                }
                self.end_input();
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.on_input_changed();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.on_input_changed();
            }
            _ => {}
        }
    }

    fn begin_input(&mut self, mode: InputMode, initial: String) {
        self.input_mode = mode;
        self.input = initial;
        self.message = None;
    }

    fn end_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    fn on_input_changed(&mut self) {
        if self.input_mode == InputMode::Search {
            self.query.search = self.input.clone();
            self.selected = 0;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = match self.screen {
            Screen::Markets => self.rows().len(),
            Screen::Portfolio => self.portfolio.positions().len(),
        };
        let selected = match self.screen {
            Screen::Markets => &mut self.selected,
            Screen::Portfolio => &mut self.position_selected,
        };
        *selected = selected
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
    }

    fn clamp_selection(&mut self) {
        let rows = self.rows().len();
        self.selected = self.selected.min(rows.saturating_sub(1));
        let positions = self.portfolio.positions().len();
        self.position_selected = self.position_selected.min(positions.saturating_sub(1));
    }

    fn toggle_favorite(&mut self) {
        let Some(symbol) = self.rows().get(self.selected).map(|record| record.symbol.clone()) else {
            return;
        };

        let pinned = self.favorites.toggle(&symbol);
        self.board.set_favorites(self.favorites.clone());
        self.persist(StorageKey::Favorites);
        self.message = Some(if pinned {
            format!("{symbol} added to favourites")
        } else {
            format!("{symbol} removed from favourites")
        });
        self.clamp_selection();
    }

    fn submit_position(&mut self) {
        let form = match parse_position_form(&self.input) {
            Ok(form) => form,
            Err(error) => {
                self.message = Some(error);
                return;
            }
        };

        match self.portfolio.add(&form.symbol, form.amount, form.buy_price) {
            Ok(_) => {
                self.on_positions_changed();
                self.message = Some(format!("added {} {}", form.amount, form.symbol.to_uppercase()));
            }
            Err(error) => self.message = Some(error.to_string()),
        }
    }

    fn remove_selected_position(&mut self) {
        let Some(id) = self
            .portfolio
            .positions()
            .get(self.position_selected)
            .map(|position| position.id)
        else {
            return;
        };

        if let Some(removed) = self.portfolio.remove(id) {
            self.on_positions_changed();
            self.message = Some(format!("removed {} {}", removed.amount, removed.symbol));
        }
    }

    fn on_positions_changed(&mut self) {
        self.board.set_held(self.portfolio.held_symbols());
        self.portfolio.revalue(&self.mapping);
        self.persist(StorageKey::Portfolio);
        self.clamp_selection();
    }

    fn submit_calculator(&mut self) {
        match parse_calculator_form(&self.input) {
            Ok(form) => {
                match ProfitCalculation::compute(
                    form.entry_price,
                    form.exit_price,
                    form.amount,
                    form.fee_percent,
                ) {
                    Some(calculation) => self.calculation = Some((form, calculation)),
                    None => {
                        self.calculation = None;
                        self.message = Some("calculation out of range".to_string());
                    }
                }
            }
            Err(error) => self.message = Some(error),
        }
    }

    fn toggle_theme(&mut self) {
        self.settings.theme = self.settings.theme.toggle();
        self.persist(StorageKey::Settings);
    }

    fn persist(&mut self, key: StorageKey) {
        let result = match key {
            StorageKey::Favorites => self.store.save(key, &self.favorites),
            StorageKey::Portfolio => self.store.save(key, &self.portfolio.positions()),
            StorageKey::Settings => self.store.save(key, &self.settings),
        };

        if let Err(error) = result {
            warn!(%error, ?key, "failed to persist local state");
            self.message = Some(format!("failed to save: {error}"));
        }
    }
}

/// Parse a `SYMBOL AMOUNT PRICE` entry.
pub fn parse_position_form(input: &str) -> Result<PositionForm, String> {
    let fields = input.split_whitespace().collect::<Vec<_>>();
    let [symbol, amount, buy_price] = fields.as_slice() else {
        return Err("expected: SYMBOL AMOUNT PRICE".to_string());
    };

    Ok(PositionForm {
        symbol: symbol.to_string(),
        amount: parse_decimal("amount", amount)?,
        buy_price: parse_decimal("price", buy_price)?,
    })
}

/// Parse an `ENTRY EXIT AMOUNT [FEE%]` entry.
pub fn parse_calculator_form(input: &str) -> Result<CalculatorForm, String> {
    let fields = input.split_whitespace().collect::<Vec<_>>();
    let (entry, exit, amount, fee) = match fields.as_slice() {
        [entry, exit, amount] => (entry, exit, amount, None),
        [entry, exit, amount, fee] => (entry, exit, amount, Some(fee)),
        _ => return Err("expected: ENTRY EXIT AMOUNT [FEE%]".to_string()),
    };

    Ok(CalculatorForm {
        entry_price: parse_decimal("entry", entry)?,
        exit_price: parse_decimal("exit", exit)?,
        amount: parse_decimal("amount", amount)?,
        fee_percent: match fee {
            Some(fee) => parse_decimal("fee", fee.trim_end_matches('%'))?,
            None => Decimal::ZERO,
        },
    })
}

fn parse_decimal(field: &str, input: &str) -> Result<Decimal, String> {
    Decimal::from_str(&input.replace(',', "")).map_err(|_| format!("{field} '{input}' is not a number"))
}
