//! Parsing chat text into commands.
//!
//! Commands start with `/`, may carry a `@botname` suffix, and take
//! whitespace-separated arguments. Any other non-blank text is a comment on
//! the current phase.

/// One chat message, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Start,
  Join {
    circle: Option<String>,
    code:   Option<String>,
  },
  Leave,
  Present {
    guests: u32,
  },
  Absent,
  NextPresent {
    guests: u32,
  },
  NextAbsent,
  Status,
  Comment(String),
  /// A known command with unusable arguments; carries the usage text.
  Usage(&'static str),
}

impl Command {
  /// Interpret `text`. Blank messages and unknown commands yield `None` and
  /// get no reply.
  pub fn parse(text: &str) -> Option<Self> {
    let text = text.trim();
    if text.is_empty() {
      return None;
    }
    let Some(body) = text.strip_prefix('/') else {
      return Some(Self::Comment(text.to_owned()));
    };

    let mut words = body.split_whitespace();
    let head = words.next()?;
    let name = head.split_once('@').map_or(head, |(name, _)| name);
    let args: Vec<&str> = words.collect();

    let command = match name {
      "start" => Self::Start,
      "join" => Self::Join {
        circle: args.first().map(|s| (*s).to_owned()),
        code:   args.get(1).map(|s| (*s).to_owned()),
      },
      "leave" => Self::Leave,
      "present" => match guests(&args) {
        Some(guests) => Self::Present { guests },
        None => Self::Usage("Usage: /present [number of guests, at most 99]"),
      },
      "absent" => Self::Absent,
      "next_present" => match guests(&args) {
        Some(guests) => Self::NextPresent { guests },
        None => Self::Usage("Usage: /next_present [number of guests, at most 99]"),
      },
      "next_absent" => Self::NextAbsent,
      "status" => Self::Status,
      _ => return None,
    };
    Some(command)
  }
}

/// Most guests one member may bring along.
pub const MAX_GUESTS: u32 = 99;

/// Guest count from the first argument: absent means none, `2` and `+2` both
/// mean two. Counts above [`MAX_GUESTS`] are rejected.
fn guests(args: &[&str]) -> Option<u32> {
  match args.first() {
    None => Some(0),
    Some(arg) => arg
      .strip_prefix('+')
      .unwrap_or(arg)
      .parse()
      .ok()
      .filter(|n| *n <= MAX_GUESTS),
  }
}
