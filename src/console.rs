use std::io::{self, BufRead, Write};

use crate::colors::BLACK;
use crate::effects::{EffectKind, Timing};
use crate::registry::{EffectRegistry, EffectRequest};
use crate::resolver::{Resolution, Resolver};
use crate::runner::EffectId;

const HELP: &str = "\
Commands:
  <sku or order>            light up the bins of an item or order
  light <Color> <led>...    light up LEDs directly
  stop <id>                 stop one effect
  clear                     stop all effects
  list                      show running effects
  show [led]                show lit LEDs, or one LED
  quit                      turn everything off and exit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Lookup(String),
    Light { color: String, addresses: Vec<usize> },
    Stop(EffectId),
    Clear,
    List,
    Show(Option<usize>),
    Help,
    Quit,
    Nothing,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a number: {0}")]
    NotANumber(String),
}

fn parse_number<T: std::str::FromStr>(word: &str) -> Result<T, CommandError> {
    word.parse()
        .map_err(|_| CommandError::NotANumber(word.to_string()))
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(Command::Nothing);
        };
        let rest: Vec<&str> = words.collect();

        match (first, rest.as_slice()) {
            ("light", [color, addresses @ ..]) if !addresses.is_empty() => Ok(Command::Light {
                color: color.to_string(),
                addresses: addresses
                    .iter()
                    .map(|word| parse_number(word))
                    .collect::<Result<_, _>>()?,
            }),
            ("light", _) => Err(CommandError::Usage("light <Color> <led>...")),
            ("stop", ["all"]) | ("clear", []) => Ok(Command::Clear),
            ("stop", [id]) => Ok(Command::Stop(parse_number(id)?)),
            ("stop", _) => Err(CommandError::Usage("stop <id>")),
            ("list", []) => Ok(Command::List),
            ("show", []) => Ok(Command::Show(None)),
            ("show", [led]) => Ok(Command::Show(Some(parse_number(led)?))),
            ("help", []) | ("?", []) => Ok(Command::Help),
            ("quit", []) | ("exit", []) => Ok(Command::Quit),
            (token, []) => Ok(Command::Lookup(token.to_string())),
            _ => Ok(Command::Lookup(line.trim().to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LookupStyle {
    pub item_color: String,
    pub order_color: String,
    pub timing: Timing,
    pub kind: EffectKind,
}

pub struct Console<'a> {
    registry: &'a EffectRegistry,
    resolver: &'a dyn Resolver,
    style: LookupStyle,
}

impl<'a> Console<'a> {
    pub fn new(
        registry: &'a EffectRegistry,
        resolver: &'a dyn Resolver,
        style: LookupStyle,
    ) -> Console<'a> {
        Console {
            registry,
            resolver,
            style,
        }
    }

    pub fn run(&self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        writeln!(output, "Enter an item or order number, 'help' for commands.")?;
        write!(output, "> ")?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let keep_going = match Command::parse(&line) {
                Ok(command) => self.execute(command, &mut output)?,
                Err(err) => {
                    writeln!(output, "{err}")?;
                    true
                }
            };
            if !keep_going {
                return Ok(());
            }
            write!(output, "> ")?;
            output.flush()?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// Returns false once the console should exit.
    pub fn execute(&self, command: Command, output: &mut impl Write) -> io::Result<bool> {
        match command {
            Command::Lookup(token) => self.lookup(&token, output)?,
            Command::Light { color, addresses } => {
                let request = EffectRequest::new(color, addresses, self.style.timing)
                    .kind(self.style.kind);
                self.start(request, None, output)?;
            }
            Command::Stop(id) => {
                if self.registry.stop_id(id) {
                    writeln!(output, "Stopped effect {id}")?;
                } else {
                    writeln!(output, "Effect {id} is not running")?;
                }
            }
            Command::Clear => match self.registry.stop_all() {
                Ok(count) => writeln!(output, "Stopped {count} effect(s)")?,
                Err(err) => writeln!(output, "All effects stopped, but {err}")?,
            },
            Command::List => self.list(output)?,
            Command::Show(led) => self.show(led, output)?,
            Command::Help => writeln!(output, "{HELP}")?,
            Command::Quit => return Ok(false),
            Command::Nothing => {}
        }
        Ok(true)
    }

    fn lookup(&self, token: &str, output: &mut impl Write) -> io::Result<()> {
        let resolution = self.resolver.resolve(token);
        let color = match &resolution {
            Resolution::Item(_) => &self.style.item_color,
            Resolution::Order(_) => &self.style.order_color,
            Resolution::Unresolved => {
                writeln!(output, "'{token}' is neither a known item nor an order")?;
                return Ok(());
            }
        };

        let request = EffectRequest::new(
            color.clone(),
            resolution.addresses().to_vec(),
            self.style.timing,
        )
        .kind(self.style.kind);
        self.start(request, resolution.channel(), output)
    }

    fn start(
        &self,
        request: EffectRequest,
        channel: Option<&str>,
        output: &mut impl Write,
    ) -> io::Result<()> {
        let addresses = request.addresses.clone();
        match self.registry.start(request, channel) {
            Ok(handle) => writeln!(output, "Effect {} lights {:?}", handle.id(), addresses),
            Err(err) => writeln!(output, "{err}"),
        }
    }

    fn list(&self, output: &mut impl Write) -> io::Result<()> {
        if self.registry.is_empty() {
            return writeln!(output, "No effects running");
        }
        for effect in self.registry.active() {
            writeln!(
                output,
                "{:>4}  {:<6} {:<8} {:<8} {:?}",
                effect.id,
                effect.channel.as_deref().unwrap_or("-"),
                effect.color_name,
                format!("{:?}", effect.state),
                effect.addresses
            )?;
        }
        Ok(())
    }

    fn show(&self, led: Option<usize>, output: &mut impl Write) -> io::Result<()> {
        let surface = self.registry.surface();
        if let Some(led) = led {
            return match surface.pixel(led) {
                Some(p) => writeln!(output, "LED {led}: ({}, {}, {})", p.red, p.green, p.blue),
                None => writeln!(
                    output,
                    "LED {led} is out of range (0 to {})",
                    surface.len().saturating_sub(1)
                ),
            };
        }

        let lit: Vec<String> = surface
            .snapshot()
            .iter()
            .enumerate()
            .filter(|(_, p)| **p != BLACK)
            .map(|(i, p)| format!("{i}=({}, {}, {})", p.red, p.green, p.blue))
            .collect();
        if lit.is_empty() {
            writeln!(output, "All {} LEDs are off", surface.len())
        } else {
            writeln!(output, "{}", lit.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use super::*;
    use crate::colors::Palette;
    use crate::resolver::{Inventory, InventoryResolver};
    use crate::sink::testing::RecordingSink;
    use crate::surface::DeviceSurface;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("   "), Ok(Command::Nothing));
        assert_eq!(Command::parse("SKU-1"), Ok(Command::Lookup("SKU-1".to_string())));
        assert_eq!(
            Command::parse("light Red 3 7"),
            Ok(Command::Light {
                color: "Red".to_string(),
                addresses: vec![3, 7],
            })
        );
        assert_eq!(Command::parse("stop 12"), Ok(Command::Stop(12)));
        assert_eq!(Command::parse("stop all"), Ok(Command::Clear));
        assert_eq!(Command::parse("clear"), Ok(Command::Clear));
        assert_eq!(Command::parse("list"), Ok(Command::List));
        assert_eq!(Command::parse("show"), Ok(Command::Show(None)));
        assert_eq!(Command::parse("show 4"), Ok(Command::Show(Some(4))));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(
            Command::parse("light Red"),
            Err(CommandError::Usage("light <Color> <led>..."))
        );
        assert_eq!(
            Command::parse("light Red three"),
            Err(CommandError::NotANumber("three".to_string()))
        );
        assert_eq!(Command::parse("stop"), Err(CommandError::Usage("stop <id>")));
        assert_eq!(
            Command::parse("stop -1"),
            Err(CommandError::NotANumber("-1".to_string()))
        );
    }

    fn fixture() -> (EffectRegistry, InventoryResolver, LookupStyle) {
        let surface = Arc::new(DeviceSurface::new(16, Box::new(RecordingSink::default())));
        let registry = EffectRegistry::new(surface, Palette::default());

        let mut inventory = Inventory::default();
        inventory.items.insert("SKU-1".to_string(), vec![3]);
        inventory.items.insert("SKU-2".to_string(), vec![9, 10]);
        inventory
            .orders
            .insert("SO-1".to_string(), vec!["SKU-1".to_string(), "SKU-2".to_string()]);

        let style = LookupStyle {
            item_color: "Green".to_string(),
            order_color: "Blue".to_string(),
            timing: Timing {
                period_secs: 1.0,
                frame_rate: 50.0,
            },
            kind: EffectKind::Static,
        };
        (registry, InventoryResolver::new(inventory), style)
    }

    fn run_session(console: &Console<'_>, input: &str) -> String {
        let mut output = Vec::new();
        console.run(Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn lookups_use_one_effect_per_channel() {
        let (registry, resolver, style) = fixture();
        let console = Console::new(&registry, &resolver, style);

        let output = run_session(&console, "SKU-1\nSKU-2\nSO-1\nlist\n");

        assert!(output.contains("Effect 1 lights [3]"), "{output}");
        assert!(output.contains("Effect 2 lights [9, 10]"), "{output}");
        assert!(output.contains("Effect 3 lights [3, 9, 10]"), "{output}");

        let active = registry.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, 2);
        assert_eq!(active[0].channel.as_deref(), Some("item"));
        assert_eq!(active[1].id, 3);
        assert_eq!(active[1].color_name, "Blue");
    }

    #[test]
    fn unknown_token_changes_nothing() {
        let (registry, resolver, style) = fixture();
        let console = Console::new(&registry, &resolver, style);

        let output = run_session(&console, "SKU-404\n");

        assert!(output.contains("'SKU-404' is neither a known item nor an order"));
        assert!(registry.is_empty());
        assert!(registry.surface().snapshot().iter().all(|p| *p == BLACK));
    }

    #[test]
    fn direct_light_stop_and_quit() {
        let (registry, resolver, style) = fixture();
        let console = Console::new(&registry, &resolver, style);

        let output = run_session(
            &console,
            "light Purple 1 2\nlight Magenta 4\nstop 1\nstop 1\nquit\nSKU-1\n",
        );

        assert!(output.contains("Effect 1 lights [1, 2]"), "{output}");
        assert!(output.contains("Color 'Magenta' not recognized"), "{output}");
        assert!(output.contains("Stopped effect 1"), "{output}");
        assert!(output.contains("Effect 1 is not running"), "{output}");
        // Input after quit is never read
        assert!(registry.is_empty());
        assert_eq!(registry.surface().pixel(1), Some(BLACK));
    }

    #[test]
    fn show_reports_pixels() {
        let (registry, resolver, style) = fixture();
        let console = Console::new(&registry, &resolver, style);

        let output = run_session(&console, "show\nshow 99\n");
        assert!(output.contains("All 16 LEDs are off"), "{output}");
        assert!(output.contains("LED 99 is out of range (0 to 15)"), "{output}");

        registry
            .surface()
            .set_pixels(&[4], palette::Srgb::new(0, 255, 0))
            .unwrap();
        let output = run_session(&console, "show\nshow 4\n");
        assert!(output.contains("4=(0, 255, 0)"), "{output}");
        assert!(output.contains("LED 4: (0, 255, 0)"), "{output}");
    }

    #[test]
    fn clear_stops_everything() {
        let (registry, resolver, style) = fixture();
        let console = Console::new(&registry, &resolver, style);

        let output = run_session(&console, "SKU-1\nlight Red 5\nclear\nlist\n");

        assert!(output.contains("Stopped 2 effect(s)"), "{output}");
        assert!(output.contains("No effects running"), "{output}");
        assert!(registry.is_empty());
    }
}
