//! # Terminal View
//!
//! A line-oriented register on stdin/stdout. Each line is parsed into a
//! [`Command`], run against the session, and answered with a cart summary,
//! a notification or a receipt. Errors are printed with a leading `!` and
//! never end the session.
//!
//! ## Example Session
//! ```text
//! till> search cola
//!    12  Cola 330ml                        $1.50  stock 40
//! till> add 12 2
//!    12  Cola 330ml                2 x     $1.50      $3.00
//!        Subtotal                                     $3.00
//!        Tax                                          $0.30
//!        TOTAL                                        $3.30
//! till> pay cash 5
//! Payment: CASH   Total $3.30   Tendered $5.00   Change $1.70
//! till> checkout
//! ...receipt...
//! ```

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use till_client::{HeldSaleStore, HistoryRange, PosApi, SaleSummary};
use till_core::validation::{parse_date, validate_reference};
use till_core::{
    ChangeDue, Customer, Money, PaymentMethod, Percentage, Product, QuantityChange,
    ValidationError,
};

use crate::commands::payment::{ChangeResponse, PaymentResponse};
use crate::commands::{cart, discount, held, payment, product, sale};
use crate::error::ApiError;
use crate::state::{CartResponse, ConfigState, SessionState};

const PROMPT: &str = "till> ";

const HELP: &str = "\
Products
  search <text>             search by name, SKU or barcode
  products                  load the default product list
Cart
  add <id> [qty]            add a product from the last search
  qty <id> <qty>            set a quantity (0 removes)
  rm <id>                   remove a line
  cart                      show the cart
  clear                     abandon the sale
  customer <id> <name>      attach a customer (customer none: walk-in)
  notes <text>              sale notes (notes alone clears them)
Discounts
  discount pct <n>          percentage off
  discount fixed <amount>   amount off
  discount clear            remove the discount
  promo <code>              validate a promo code with the server
Payment
  pay cash [amount]         cash, optionally with the amount tendered
  pay card [ref]            card, optionally with the transaction reference
  pay digital [ref]         digital wallet
  pay split                 split across methods
  tender <amount>           cash tendered
  ref <reference>           card or wallet transaction reference
  split <method> <amount> [ref]   add a split leg
  split rm <n>              remove split leg n
  change                    change due for the cash tendered
Sale
  checkout                  submit the sale and print the receipt
  hold                      park the sale
  recall                    resume the parked sale
  history [from] [to]       past sales, dates as YYYY-MM-DD
  receipt                   show the last receipt again
  print [receipt#]          save the PDF receipt
  quit";

// =============================================================================
// Commands
// =============================================================================

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Products,
    Add { product_id: i64, quantity: Option<i64> },
    Quantity { product_id: i64, quantity: i64 },
    Remove(i64),
    Cart,
    Clear,
    Customer(Option<Customer>),
    Notes(String),
    DiscountPercent(Percentage),
    DiscountFixed(Money),
    DiscountClear,
    Promo(String),
    Pay {
        method: PaymentMethod,
        tendered: Option<Money>,
        reference: Option<String>,
    },
    Tender(Money),
    Reference(String),
    SplitAdd {
        method: PaymentMethod,
        amount: Money,
        reference: Option<String>,
    },
    /// 0-based position of the leg.
    SplitRemove(usize),
    Change,
    Checkout,
    Hold,
    Recall,
    History(HistoryRange),
    Receipt,
    Print(Option<String>),
    Help,
    Quit,
}

impl Command {
    /// Parses one line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, ApiError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = split_word(line);
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word.to_lowercase().as_str() {
            "search" | "s" => Command::Search(rest.to_string()),
            "products" => Command::Products,
            "add" | "a" => Command::Add {
                product_id: integer(required(&args, 0, "product id")?, "product id")?,
                quantity: args
                    .get(1)
                    .map(|q| integer(q, "quantity"))
                    .transpose()?,
            },
            "qty" => Command::Quantity {
                product_id: integer(required(&args, 0, "product id")?, "product id")?,
                quantity: integer(required(&args, 1, "quantity")?, "quantity")?,
            },
            "rm" | "remove" => {
                Command::Remove(integer(required(&args, 0, "product id")?, "product id")?)
            }
            "cart" => Command::Cart,
            "clear" => Command::Clear,
            "customer" => match args.as_slice() {
                [] => return Err(usage("customer <id> <name> | customer none")),
                ["none"] | ["walk-in"] => Command::Customer(None),
                [id, ..] => {
                    let (_, name) = split_word(rest);
                    Command::Customer(Some(Customer {
                        id: integer(id, "customer id")?,
                        name: name.to_string(),
                    }))
                }
            },
            "notes" => Command::Notes(rest.to_string()),
            "discount" => match args.as_slice() {
                ["pct" | "percent", value] => Command::DiscountPercent(Percentage::parse(value)?),
                ["fixed" | "amount", value] => Command::DiscountFixed(Money::parse(value)?),
                ["clear" | "none"] => Command::DiscountClear,
                _ => {
                    return Err(usage(
                        "discount pct <n> | discount fixed <amount> | discount clear",
                    ))
                }
            },
            "promo" => Command::Promo(required(&args, 0, "promo code")?.to_string()),
            "pay" => {
                let method: PaymentMethod = required(&args, 0, "payment method")?.parse()?;
                let detail = args.get(1).copied();
                match method {
                    PaymentMethod::Cash => Command::Pay {
                        method,
                        tendered: detail.map(Money::parse).transpose()?,
                        reference: None,
                    },
                    PaymentMethod::Card | PaymentMethod::Digital => Command::Pay {
                        method,
                        tendered: None,
                        reference: detail.map(str::to_string),
                    },
                    PaymentMethod::Split => Command::Pay {
                        method,
                        tendered: None,
                        reference: None,
                    },
                }
            }
            "tender" => Command::Tender(Money::parse(required(&args, 0, "amount")?)?),
            "ref" => Command::Reference(rest.to_string()),
            "split" => match args.as_slice() {
                ["rm" | "remove", n] => {
                    let n = integer(n, "split leg")?;
                    if n < 1 {
                        return Err(ValidationError::MustBePositive {
                            field: "split leg".to_string(),
                        }
                        .into());
                    }
                    Command::SplitRemove((n - 1) as usize)
                }
                [method, amount, reference @ ..] => Command::SplitAdd {
                    method: method.parse()?,
                    amount: Money::parse(amount)?,
                    reference: (!reference.is_empty()).then(|| reference.join(" ")),
                },
                _ => return Err(usage("split <method> <amount> [ref] | split rm <n>")),
            },
            "change" => Command::Change,
            "checkout" => Command::Checkout,
            "hold" => Command::Hold,
            "recall" => Command::Recall,
            "history" => Command::History(HistoryRange {
                start: args
                    .first()
                    .map(|d| parse_date("start date", d))
                    .transpose()?,
                end: args.get(1).map(|d| parse_date("end date", d)).transpose()?,
            }),
            "receipt" => Command::Receipt,
            "print" => Command::Print(args.first().map(|n| n.to_string())),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => {
                return Err(ApiError::validation(format!(
                    "Unknown command '{}'. Type 'help' for the list.",
                    other
                )))
            }
        };

        Ok(Some(command))
    }
}

fn split_word(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    }
}

fn required<'a>(args: &[&'a str], index: usize, field: &str) -> Result<&'a str, ApiError> {
    args.get(index).copied().ok_or_else(|| {
        ValidationError::Required {
            field: field.to_string(),
        }
        .into()
    })
}

fn integer(input: &str, field: &str) -> Result<i64, ApiError> {
    input.parse().map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected a whole number".to_string(),
        }
        .into()
    })
}

fn usage(text: &str) -> ApiError {
    ApiError::validation(format!("Usage: {}", text))
}

// =============================================================================
// Register
// =============================================================================

/// The terminal register: commands wired to one session.
pub struct Register<'a> {
    api: &'a dyn PosApi,
    session: &'a SessionState,
    config: &'a ConfigState,
    held: &'a HeldSaleStore,
    receipt_dir: PathBuf,
}

impl<'a> Register<'a> {
    pub fn new(
        api: &'a dyn PosApi,
        session: &'a SessionState,
        config: &'a ConfigState,
        held: &'a HeldSaleStore,
        receipt_dir: impl Into<PathBuf>,
    ) -> Self {
        Register {
            api,
            session,
            config,
            held,
            receipt_dir: receipt_dir.into(),
        }
    }

    /// Reads commands until end of input or `quit`.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let banner = format!(
            "{} register. Type 'help' for commands.\n",
            self.config.store_info().name
        );
        output.write_all(banner.as_bytes()).await?;

        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let reply = match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.execute(command).await,
                Err(err) => Err(err),
            };

            let text = match reply {
                Ok(text) => text,
                Err(err) => {
                    debug!(code = ?err.code, message = %err.message, "Command failed");
                    format!("! {}", err.message)
                }
            };
            output.write_all(text.as_bytes()).await?;
            output.write_all(b"\n").await?;
        }

        output.write_all(b"\n").await?;
        output.flush().await
    }

    /// Runs one command and renders its answer.
    pub async fn execute(&self, command: Command) -> Result<String, ApiError> {
        let session = self.session;
        let config = self.config;

        match command {
            Command::Search(query) => {
                let products = product::search(self.api, session, &query).await?;
                Ok(render_products(&products, config))
            }
            Command::Products => {
                let products = product::load_catalog(self.api, session).await?;
                Ok(render_products(&products, config))
            }
            Command::Add {
                product_id,
                quantity,
            } => cart::add_item(session, product_id, quantity).map(|c| render_cart(&c, config)),
            Command::Quantity {
                product_id,
                quantity,
            } => {
                let response = cart::set_quantity(session, product_id, quantity)?;
                Ok(match response.change {
                    QuantityChange::NotInCart => format!("Product {} is not in the cart", product_id),
                    _ => render_cart(&response.cart, config),
                })
            }
            Command::Remove(product_id) => {
                Ok(render_cart(&cart::remove_item(session, product_id), config))
            }
            Command::Cart => Ok(render_cart(&cart::get_cart(session), config)),
            Command::Clear => {
                cart::clear(session);
                Ok("Sale cleared.".to_string())
            }
            Command::Customer(customer) => {
                cart::set_customer(session, customer).map(|c| render_cart(&c, config))
            }
            Command::Notes(notes) => Ok(match cart::set_notes(session, &notes)? {
                Some(notes) => format!("Notes: {}", notes),
                None => "Notes cleared.".to_string(),
            }),
            Command::DiscountPercent(percentage) => {
                discount::apply_percentage(session, percentage).map(|c| render_cart(&c, config))
            }
            Command::DiscountFixed(amount) => {
                discount::apply_fixed(session, amount).map(|c| render_cart(&c, config))
            }
            Command::DiscountClear => Ok(render_cart(&discount::clear_discount(session), config)),
            Command::Promo(code) => discount::apply_promo(self.api, session, &code)
                .await
                .map(|c| render_cart(&c, config)),
            Command::Pay {
                method,
                tendered,
                reference,
            } => {
                // Checked before switching so a bad reference changes nothing.
                let reference = reference.as_deref().map(validate_reference).transpose()?;
                let mut panel = payment::select_payment(session, method);
                if let Some(tendered) = tendered {
                    panel = payment::set_tendered(session, tendered)?;
                }
                if let Some(reference) = reference {
                    panel = payment::set_reference(session, &reference)?;
                }
                Ok(render_payment(&panel, config))
            }
            Command::Tender(amount) => {
                payment::set_tendered(session, amount).map(|p| render_payment(&p, config))
            }
            Command::Reference(reference) => {
                payment::set_reference(session, &reference).map(|p| render_payment(&p, config))
            }
            Command::SplitAdd {
                method,
                amount,
                reference,
            } => payment::add_split_payment(session, method, amount, reference.as_deref())
                .map(|p| render_payment(&p, config)),
            Command::SplitRemove(index) => {
                payment::remove_split_payment(session, index).map(|p| render_payment(&p, config))
            }
            Command::Change => payment::change(session).map(|c| render_change(&c, config)),
            Command::Checkout => {
                let response = sale::checkout(self.api, session, config).await?;
                Ok(response.printed)
            }
            Command::Hold => {
                let response = held::hold(session, self.held)?;
                Ok(format!(
                    "Sale held ({} line{}). Type 'recall' to resume it.",
                    response.item_count,
                    if response.item_count == 1 { "" } else { "s" }
                ))
            }
            Command::Recall => held::recall(session, self.held).map(|c| render_cart(&c, config)),
            Command::History(range) => {
                let sales = sale::history(self.api, range).await?;
                Ok(render_history(&sales, config))
            }
            Command::Receipt => sale::last_receipt(session, config),
            Command::Print(number) => {
                let path =
                    sale::print_receipt(self.api, session, number.as_deref(), &self.receipt_dir)
                        .await?;
                Ok(format!("Receipt saved to {}", path.display()))
            }
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn render_products(products: &[Product], config: &ConfigState) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }

    products
        .iter()
        .map(|p| {
            let flag = if !p.in_stock() {
                "  OUT OF STOCK"
            } else if p.is_low_stock() {
                "  low"
            } else {
                ""
            };
            format!(
                "{:>5}  {:<28} {:>10}  stock {}{}",
                p.id,
                truncate(&p.name, 28),
                config.format(p.price),
                p.stock,
                flag
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_cart(cart: &CartResponse, config: &ConfigState) -> String {
    if cart.items.is_empty() {
        return "Cart is empty.".to_string();
    }

    let mut lines: Vec<String> = cart
        .items
        .iter()
        .map(|item| {
            format!(
                "{:>5}  {:<22} {:>3} x {:>9} {:>10}",
                item.product_id,
                truncate(&item.name, 22),
                item.quantity,
                config.format(item.unit_price),
                config.format(item.line_total())
            )
        })
        .collect();

    let total_line =
        |label: &str, amount: Money| format!("       {:<40} {:>10}", label, config.format(amount));
    lines.push(total_line("Subtotal", cart.totals.subtotal));
    if cart.totals.discount.is_positive() {
        lines.push(total_line(
            &cart.discount.to_string(),
            Money::zero() - cart.totals.discount,
        ));
    }
    lines.push(total_line("Tax", cart.totals.tax));
    lines.push(total_line("TOTAL", cart.totals.total));

    if let Some(customer) = &cart.customer {
        lines.push(format!("       Customer: {} (#{})", customer.name, customer.id));
    }
    lines.join("\n")
}

fn render_payment(panel: &PaymentResponse, config: &ConfigState) -> String {
    let mut text = format!(
        "Payment: {}   Total {}",
        panel.method.as_str().to_uppercase(),
        config.format(panel.total)
    );

    if let Some(tendered) = panel.tendered.filter(|_| panel.method == PaymentMethod::Cash) {
        text.push_str(&format!("   Tendered {}", config.format(tendered)));
    }
    match panel.change {
        Some(ChangeDue::Change(amount)) => {
            text.push_str(&format!("   Change {}", config.format(amount)))
        }
        Some(ChangeDue::Shortfall(amount)) => {
            text.push_str(&format!("   Short {}", config.format(amount)))
        }
        None => {}
    }

    if panel.method == PaymentMethod::Split {
        for (i, leg) in panel.split_payments.iter().enumerate() {
            text.push_str(&format!(
                "\n  {}. {:<8} {:>10}{}",
                i + 1,
                leg.method.as_str(),
                config.format(leg.amount),
                leg.reference
                    .as_deref()
                    .map(|r| format!("  ref {}", r))
                    .unwrap_or_default()
            ));
        }
        text.push_str(&format!(
            "\n  Paid {}   Remaining {}",
            config.format(panel.split_paid),
            config.format(panel.split_remaining)
        ));
    }
    text
}

fn render_change(change: &ChangeResponse, config: &ConfigState) -> String {
    match change.due {
        ChangeDue::Change(amount) => format!("Change due: {}", config.format(amount)),
        ChangeDue::Shortfall(amount) => format!(
            "Insufficient: {} more needed (total {}, tendered {})",
            config.format(amount),
            config.format(change.total),
            config.format(change.tendered)
        ),
    }
}

fn render_history(sales: &[SaleSummary], config: &ConfigState) -> String {
    if sales.is_empty() {
        return "No sales found.".to_string();
    }

    sales
        .iter()
        .map(|s| {
            format!(
                "{:<18} {}  {:<20} {:>3} items {:>10}  {}",
                s.receipt_number,
                s.created_at.format("%Y-%m-%d %H:%M"),
                truncate(s.customer_name.as_deref().unwrap_or("Walk-in"), 20),
                s.item_count,
                config.format(s.total_amount),
                s.payment_method
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{product, FakeApi};
    use crate::error::ErrorCode;
    use chrono::NaiveDate;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_cart_commands() {
        assert_eq!(parse("search coke zero"), Command::Search("coke zero".to_string()));
        assert_eq!(
            parse("add 12 2"),
            Command::Add {
                product_id: 12,
                quantity: Some(2)
            }
        );
        assert_eq!(
            parse("ADD 12"),
            Command::Add {
                product_id: 12,
                quantity: None
            }
        );
        assert_eq!(
            parse("qty 12 0"),
            Command::Quantity {
                product_id: 12,
                quantity: 0
            }
        );
        assert_eq!(parse("rm 12"), Command::Remove(12));
        assert_eq!(
            parse("customer 7 Ada Lovelace"),
            Command::Customer(Some(Customer {
                id: 7,
                name: "Ada Lovelace".to_string()
            }))
        );
        assert_eq!(parse("customer none"), Command::Customer(None));
        assert_eq!(parse("notes"), Command::Notes(String::new()));
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("# comment").unwrap(), None);
    }

    #[test]
    fn test_parse_discount_and_payment() {
        assert_eq!(
            parse("discount pct 10"),
            Command::DiscountPercent(Percentage::from_bps(1000))
        );
        assert_eq!(
            parse("discount fixed 2.50"),
            Command::DiscountFixed(Money::from_cents(250))
        );
        assert_eq!(parse("promo SAVE5"), Command::Promo("SAVE5".to_string()));
        assert_eq!(
            parse("pay cash 20.00"),
            Command::Pay {
                method: PaymentMethod::Cash,
                tendered: Some(Money::from_cents(2000)),
                reference: None
            }
        );
        assert_eq!(
            parse("pay card AUTH-1"),
            Command::Pay {
                method: PaymentMethod::Card,
                tendered: None,
                reference: Some("AUTH-1".to_string())
            }
        );
        assert_eq!(
            parse("split card 5 AUTH 9"),
            Command::SplitAdd {
                method: PaymentMethod::Card,
                amount: Money::from_cents(500),
                reference: Some("AUTH 9".to_string())
            }
        );
        assert_eq!(parse("split rm 2"), Command::SplitRemove(1));
    }

    #[test]
    fn test_parse_sale_commands() {
        assert_eq!(
            parse("history 2024-01-01 2024-01-31"),
            Command::History(HistoryRange {
                start: NaiveDate::from_ymd_opt(2024, 1, 1),
                end: NaiveDate::from_ymd_opt(2024, 1, 31),
            })
        );
        assert_eq!(parse("history"), Command::History(HistoryRange::default()));
        assert_eq!(parse("print"), Command::Print(None));
        assert_eq!(parse("print R-9"), Command::Print(Some("R-9".to_string())));
        assert_eq!(parse("quit"), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            "frobnicate",
            "add",
            "add twelve",
            "qty 12",
            "discount pct",
            "discount pct ten",
            "pay bitcoin",
            "pay cash -5",
            "split rm 0",
            "history 31/01/2024",
        ];
        for line in cases {
            let err = Command::parse(line).unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError, "{}", line);
        }
    }

    #[tokio::test]
    async fn test_bad_reference_does_not_switch_method() {
        let api = FakeApi::default();
        let session = SessionState::new();
        let config = ConfigState::default();
        let dir = tempfile::tempdir().unwrap();
        let store = HeldSaleStore::new(dir.path().join("held_sale.json"));
        let register = Register::new(&api, &session, &config, &store, dir.path());

        let command = Command::Pay {
            method: PaymentMethod::Card,
            tendered: None,
            reference: Some("x".repeat(101)),
        };
        assert!(register.execute(command).await.is_err());
        session.with_session(|s| assert_eq!(s.payment.method(), PaymentMethod::Cash));
    }

    #[tokio::test]
    async fn test_session_transcript() {
        let api = FakeApi::with_products(vec![product(1, 1000, 10, 1000)]);
        let session = SessionState::new();
        let config = ConfigState::default();
        let dir = tempfile::tempdir().unwrap();
        let store = HeldSaleStore::new(dir.path().join("held_sale.json"));
        let register = Register::new(&api, &session, &config, &store, dir.path());

        let input: &[u8] = b"search product\n\
            add 1 2\n\
            bogus\n\
            discount pct 50\n\
            pay cash 15\n\
            change\n\
            checkout\n\
            quit\n\
            cart\n";
        let mut output = Vec::new();
        register.run(input, &mut output).await.unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("Product 1"));
        assert!(output.contains("! Unknown command 'bogus'"));
        assert!(output.contains("Change due: $3.00"));
        assert!(output.contains("Receipt #: R-0001"));
        assert!(output.contains("Thank you for your business!"));
        assert!(!output.contains("Cart is empty."));
        assert_eq!(api.sale_count(), 1);
    }

    #[test]
    fn test_render_cart_shows_discount_and_customer() {
        let config = ConfigState::default();
        let session = SessionState::new();
        session.with_session_mut(|s| {
            s.cart.add_item(&product(1, 1000, 10, 1000), 2).unwrap();
            s.cart
                .apply_discount(till_core::Discount::Percentage(Percentage::from_bps(1000)))
                .unwrap();
            s.customer = Some(Customer {
                id: 3,
                name: "Ada".to_string(),
            });
        });

        let text = render_cart(&cart::get_cart(&session), &config);
        assert!(text.contains("Discount (10%)"));
        assert!(text.contains("-$2.00"));
        assert!(text.contains("$20.00"));
        assert!(text.contains("Customer: Ada (#3)"));
    }
}
