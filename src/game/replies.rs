//! User-facing reply texts.
//!
//! Every processed message yields exactly one [`Reply`]; its `Display` impl is the text sent
//! back to the chat platform.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A round started and the user plays first.
    RoundStarted,
    /// A round started with a bot-chosen opening word.
    RoundStartedSeeded { seed: String, next: char },
    /// The user gave up or quit.
    RoundEnded { score: u32, start: String },
    /// Quit while no round is running.
    NoRoundRunning { start: String },
    /// Gameplay text while no round is running.
    StartPrompt { start: String },
    TooShort { word: String, min_chars: usize },
    NotAWord { word: String },
    AlreadyUsed { word: String },
    WrongStart { required: char, word: String },
    /// The bot has no continuation; the user wins the round.
    UserWins { last: char, score: Option<u32> },
    /// The bot's counter-word.
    BotWord { word: String, score: Option<u32> },
    Help {
        start: String,
        quit: String,
        min_chars: usize,
        no_repeats: bool,
    },
    /// Status while a round is running.
    Turn { required: Option<char>, score: u32 },
    /// Status while no round is running.
    Idle {
        rounds_played: u32,
        rounds_won: u32,
        start: String,
    },
    /// The session could not be read or saved.
    Unavailable,
}

impl Reply {
    /// Rejections leave the session untouched and keep the round running.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Reply::TooShort { .. }
                | Reply::NotAWord { .. }
                | Reply::AlreadyUsed { .. }
                | Reply::WrongStart { .. }
        )
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::RoundStarted => write!(f, "接龍開始！請先說一個詞語或成語～"),
            Reply::RoundStartedSeeded { seed, next } => write!(
                f,
                "接龍開始！我先出：「{}」，請用「{}」開頭接下去～",
                seed, next
            ),
            Reply::RoundEnded { score, start } => write!(
                f,
                "遊戲結束！這局你接了 {} 個詞。想再玩請說「{}」。",
                score, start
            ),
            Reply::NoRoundRunning { start } => {
                write!(f, "目前沒有進行中的遊戲。說「{}」開始接龍吧！", start)
            }
            Reply::StartPrompt { start } => {
                write!(f, "還沒開始遊戲唷～說「{}」開始接龍！", start)
            }
            Reply::TooShort { word, min_chars } => write!(
                f,
                "「{}」太短了，至少要 {} 個字唷～",
                word, min_chars
            ),
            Reply::NotAWord { word } => write!(f, "「{}」不是有效的詞語或成語唷～", word),
            Reply::AlreadyUsed { word } => {
                write!(f, "「{}」這局已經用過了，換一個吧！", word)
            }
            Reply::WrongStart { required, word } => write!(
                f,
                "要用「{}」開頭的詞語或成語才行！你用了「{}」",
                required, word
            ),
            Reply::UserWins { last, score } => {
                write!(f, "我想不到「{}」開頭的詞語或成語了...你贏啦！👏", last)?;
                if let Some(score) = score {
                    write!(f, "（這局你接了 {} 個詞）", score)?;
                }
                Ok(())
            }
            Reply::BotWord { word, score } => {
                write!(f, "接得好～我接：「{}」！換你～", word)?;
                if let Some(score) = score {
                    write!(f, "（目前 {} 分）", score)?;
                }
                Ok(())
            }
            Reply::Help {
                start,
                quit,
                min_chars,
                no_repeats,
            } => {
                write!(
                    f,
                    "【接龍規則】每個詞的第一個字要接上一個詞的最後一個字，至少 {} 個字",
                    min_chars
                )?;
                if *no_repeats {
                    write!(f, "，同一局不能重複")?;
                }
                write!(f, "。說「{}」開始，說「{}」結束。", start, quit)
            }
            Reply::Turn {
                required: Some(c),
                score,
            } => write!(
                f,
                "輪到你：請用「{}」開頭的詞語（這局已接 {} 個）",
                c, score
            ),
            Reply::Turn {
                required: None,
                score,
            } => write!(f, "輪到你：請先說一個詞語開局～（這局已接 {} 個）", score),
            Reply::Idle {
                rounds_played,
                rounds_won,
                start,
            } => write!(
                f,
                "目前沒有進行中的遊戲。你已玩 {} 局、贏了 {} 局。說「{}」開始！",
                rounds_played, rounds_won, start
            ),
            Reply::Unavailable => write!(f, "抱歉，系統暫時忙不過來，請稍後再試 🙏"),
        }
    }
}
