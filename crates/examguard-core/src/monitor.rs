//! Integrity violation monitor.
//!
//! Translates raw environment signals from the host (focus, visibility,
//! fullscreen, context menu, clipboard, keyboard) into tagged violations.
//! The monitor never touches session state; the session feeds it signals
//! and acts on the returned [`Observation`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clipboard operation attempted by the test-taker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardAction {
    Copy,
    Cut,
    Paste,
}

impl fmt::Display for ClipboardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardAction::Copy => write!(f, "copy"),
            ClipboardAction::Cut => write!(f, "cut"),
            ClipboardAction::Paste => write!(f, "paste"),
        }
    }
}

/// A key press with its modifier state, e.g. `Ctrl+Shift+I`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCombo {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyCombo {
    /// A bare key with no modifiers.
    pub fn key(key: &str) -> Self {
        Self {
            key: normalize_key(key),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            ctrl: true,
            ..Self::key(key)
        }
    }

    pub fn ctrl_shift(key: &str) -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::key(key)
        }
    }

    /// The same combo with its key name in canonical form.
    pub fn normalized(&self) -> Self {
        Self {
            key: normalize_key(&self.key),
            ..self.clone()
        }
    }

    /// Key names are compared in normalized form, so a combo built by hand
    /// from a raw `"esc"` or `"c"` still matches.
    pub fn is_escape(&self) -> bool {
        normalize_key(&self.key) == "Escape"
    }

    /// Developer-tools, view-source, and clipboard accelerators.
    /// Ctrl and Meta both count as the accelerator modifier.
    pub fn is_forbidden(&self) -> bool {
        let accel = self.ctrl || self.meta;
        match normalize_key(&self.key).as_str() {
            "F12" => true,
            "I" | "J" | "C" if accel && self.shift => true,
            "I" if accel && self.alt => true,
            "U" | "C" | "X" | "V" if accel => true,
            _ => false,
        }
    }
}

fn normalize_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "esc" | "escape" => "Escape".to_string(),
        k if k.len() == 1 => k.to_ascii_uppercase(),
        k if k.starts_with('f') && k[1..].parse::<u8>().is_ok() => k.to_ascii_uppercase(),
        _ => key.to_string(),
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.meta {
            write!(f, "Meta+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyCombo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(format!("empty key combination: '{s}'"));
        };
        if key.is_empty() {
            return Err(format!("missing key in combination: '{s}'"));
        }

        let mut combo = KeyCombo::key(key);
        for m in modifiers {
            match m.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => combo.ctrl = true,
                "shift" => combo.shift = true,
                "alt" | "option" => combo.alt = true,
                "meta" | "cmd" | "command" | "super" => combo.meta = true,
                other => return Err(format!("unknown modifier: {other}")),
            }
        }
        Ok(combo)
    }
}

impl TryFrom<String> for KeyCombo {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyCombo> for String {
    fn from(combo: KeyCombo) -> Self {
        combo.to_string()
    }
}

/// A raw, platform-neutral environment event delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvironmentSignal {
    WindowBlur,
    WindowFocus,
    VisibilityChanged { hidden: bool },
    FullscreenChanged { active: bool },
    ContextMenu,
    Clipboard { action: ClipboardAction },
    KeyDown { combo: KeyCombo },
}

impl FromStr for EnvironmentSignal {
    type Err = String;

    /// Parses the short names used by scripts and the terminal host.
    /// Key presses are not covered here; parse a [`KeyCombo`] instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let signal = match s.trim().to_ascii_lowercase().as_str() {
            "blur" | "window-blur" => EnvironmentSignal::WindowBlur,
            "focus" | "window-focus" => EnvironmentSignal::WindowFocus,
            "hidden" | "hide" | "tab-hidden" => EnvironmentSignal::VisibilityChanged { hidden: true },
            "visible" | "tab-visible" => EnvironmentSignal::VisibilityChanged { hidden: false },
            "exit-fullscreen" | "fullscreen-exit" => {
                EnvironmentSignal::FullscreenChanged { active: false }
            }
            "enter-fullscreen" | "fullscreen-enter" => {
                EnvironmentSignal::FullscreenChanged { active: true }
            }
            "context-menu" | "contextmenu" => EnvironmentSignal::ContextMenu,
            "copy" => EnvironmentSignal::Clipboard {
                action: ClipboardAction::Copy,
            },
            "cut" => EnvironmentSignal::Clipboard {
                action: ClipboardAction::Cut,
            },
            "paste" => EnvironmentSignal::Clipboard {
                action: ClipboardAction::Paste,
            },
            other => return Err(format!("unknown environment signal: {other}")),
        };
        Ok(signal)
    }
}

/// The channel a violation was detected on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum ViolationKind {
    FocusLost,
    TabHidden,
    FullscreenExit,
    ContextMenu,
    Clipboard { action: ClipboardAction },
    ForbiddenShortcut { combo: KeyCombo },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::FocusLost => write!(f, "window focus lost"),
            ViolationKind::TabHidden => write!(f, "tab hidden"),
            ViolationKind::FullscreenExit => write!(f, "fullscreen exit"),
            ViolationKind::ContextMenu => write!(f, "context menu"),
            ViolationKind::Clipboard { action } => write!(f, "clipboard {action}"),
            ViolationKind::ForbiddenShortcut { combo } => write!(f, "forbidden shortcut {combo}"),
        }
    }
}

/// One detected violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationEvent {
    pub kind: ViolationKind,
    pub timestamp: DateTime<Utc>,
}

impl ViolationEvent {
    pub fn now(kind: ViolationKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// What the monitor detected in a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// A strike for the escalation policy.
    Violation(ViolationEvent),
    /// The Escape channel, which bypasses the policy.
    Escape,
}

/// The monitor's verdict on one signal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Observation {
    pub detection: Option<Detection>,
    /// The host should cancel the signal's default effect.
    pub suppress_default: bool,
}

impl Observation {
    fn ignored() -> Self {
        Self::default()
    }

    fn violation(kind: ViolationKind, suppress_default: bool) -> Self {
        Self {
            detection: Some(Detection::Violation(ViolationEvent::now(kind))),
            suppress_default,
        }
    }
}

/// Classifies environment signals while armed.
#[derive(Debug, Clone, Default)]
pub struct ViolationMonitor {
    armed: bool,
}

impl ViolationMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Classify one signal. A disarmed monitor detects and suppresses nothing.
    pub fn observe(&self, signal: &EnvironmentSignal) -> Observation {
        if !self.armed {
            tracing::debug!(?signal, "monitor disarmed, ignoring signal");
            return Observation::ignored();
        }

        match signal {
            EnvironmentSignal::WindowBlur => Observation::violation(ViolationKind::FocusLost, false),
            EnvironmentSignal::VisibilityChanged { hidden: true } => {
                Observation::violation(ViolationKind::TabHidden, false)
            }
            EnvironmentSignal::FullscreenChanged { active: false } => {
                Observation::violation(ViolationKind::FullscreenExit, false)
            }
            EnvironmentSignal::ContextMenu => {
                Observation::violation(ViolationKind::ContextMenu, true)
            }
            EnvironmentSignal::Clipboard { action } => {
                Observation::violation(ViolationKind::Clipboard { action: *action }, true)
            }
            EnvironmentSignal::KeyDown { combo } if combo.is_escape() => Observation {
                detection: Some(Detection::Escape),
                suppress_default: true,
            },
            EnvironmentSignal::KeyDown { combo } if combo.is_forbidden() => Observation::violation(
                ViolationKind::ForbiddenShortcut {
                    combo: combo.normalized(),
                },
                true,
            ),
            EnvironmentSignal::WindowFocus
            | EnvironmentSignal::VisibilityChanged { hidden: false }
            | EnvironmentSignal::FullscreenChanged { active: true }
            | EnvironmentSignal::KeyDown { .. } => Observation::ignored(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed() -> ViolationMonitor {
        let mut monitor = ViolationMonitor::new();
        monitor.arm();
        monitor
    }

    fn kind_of(obs: &Observation) -> Option<&ViolationKind> {
        match &obs.detection {
            Some(Detection::Violation(event)) => Some(&event.kind),
            _ => None,
        }
    }

    #[test]
    fn disarmed_monitor_ignores_everything() {
        let monitor = ViolationMonitor::new();
        let obs = monitor.observe(&EnvironmentSignal::ContextMenu);
        assert_eq!(obs, Observation::default());
        let obs = monitor.observe(&EnvironmentSignal::KeyDown {
            combo: KeyCombo::key("Escape"),
        });
        assert!(obs.detection.is_none());
        assert!(!obs.suppress_default);
    }

    #[test]
    fn each_channel_maps_to_its_kind() {
        let monitor = armed();
        let cases = [
            (EnvironmentSignal::WindowBlur, ViolationKind::FocusLost),
            (
                EnvironmentSignal::VisibilityChanged { hidden: true },
                ViolationKind::TabHidden,
            ),
            (
                EnvironmentSignal::FullscreenChanged { active: false },
                ViolationKind::FullscreenExit,
            ),
            (EnvironmentSignal::ContextMenu, ViolationKind::ContextMenu),
            (
                EnvironmentSignal::Clipboard {
                    action: ClipboardAction::Paste,
                },
                ViolationKind::Clipboard {
                    action: ClipboardAction::Paste,
                },
            ),
        ];
        for (signal, expected) in cases {
            let obs = monitor.observe(&signal);
            assert_eq!(kind_of(&obs), Some(&expected), "signal {signal:?}");
        }
    }

    #[test]
    fn benign_signals_are_ignored() {
        let monitor = armed();
        for signal in [
            EnvironmentSignal::WindowFocus,
            EnvironmentSignal::VisibilityChanged { hidden: false },
            EnvironmentSignal::FullscreenChanged { active: true },
            EnvironmentSignal::KeyDown {
                combo: KeyCombo::key("a"),
            },
            EnvironmentSignal::KeyDown {
                combo: KeyCombo::ctrl("a"),
            },
        ] {
            assert_eq!(monitor.observe(&signal), Observation::default());
        }
    }

    #[test]
    fn suppression_follows_channel() {
        let monitor = armed();
        assert!(monitor.observe(&EnvironmentSignal::ContextMenu).suppress_default);
        assert!(
            monitor
                .observe(&EnvironmentSignal::Clipboard {
                    action: ClipboardAction::Copy
                })
                .suppress_default
        );
        assert!(!monitor.observe(&EnvironmentSignal::WindowBlur).suppress_default);
    }

    #[test]
    fn forbidden_shortcuts() {
        for combo in [
            "F12",
            "Ctrl+Shift+I",
            "Ctrl+Shift+J",
            "Ctrl+Shift+C",
            "Meta+Alt+I",
            "Ctrl+U",
            "Ctrl+C",
            "Ctrl+X",
            "Cmd+V",
        ] {
            let combo: KeyCombo = combo.parse().unwrap();
            assert!(combo.is_forbidden(), "{combo} should be forbidden");
        }
        for combo in ["I", "Shift+I", "Ctrl+A", "Alt+U", "F5"] {
            let combo: KeyCombo = combo.parse().unwrap();
            assert!(!combo.is_forbidden(), "{combo} should be allowed");
        }
    }

    #[test]
    fn raw_key_names_are_matched_case_insensitively() {
        let monitor = armed();

        let copy = EnvironmentSignal::KeyDown {
            combo: KeyCombo {
                key: "c".into(),
                ctrl: true,
                shift: false,
                alt: false,
                meta: false,
            },
        };
        let obs = monitor.observe(&copy);
        assert_eq!(
            kind_of(&obs),
            Some(&ViolationKind::ForbiddenShortcut {
                combo: KeyCombo::ctrl("C")
            })
        );
        assert!(obs.suppress_default);

        let devtools = EnvironmentSignal::KeyDown {
            combo: KeyCombo {
                key: "f12".into(),
                ctrl: false,
                shift: false,
                alt: false,
                meta: false,
            },
        };
        assert!(kind_of(&monitor.observe(&devtools)).is_some());

        let esc = EnvironmentSignal::KeyDown {
            combo: KeyCombo {
                key: "Esc".into(),
                ctrl: false,
                shift: false,
                alt: false,
                meta: false,
            },
        };
        assert_eq!(monitor.observe(&esc).detection, Some(Detection::Escape));
    }

    #[test]
    fn escape_is_its_own_channel() {
        let monitor = armed();
        let obs = monitor.observe(&EnvironmentSignal::KeyDown {
            combo: "Esc".parse().unwrap(),
        });
        assert_eq!(obs.detection, Some(Detection::Escape));
        assert!(obs.suppress_default);
    }

    #[test]
    fn key_combo_parse_and_display() {
        let combo: KeyCombo = "ctrl+shift+i".parse().unwrap();
        assert_eq!(combo, KeyCombo::ctrl_shift("I"));
        assert_eq!(combo.to_string(), "Ctrl+Shift+I");
        assert_eq!("f12".parse::<KeyCombo>().unwrap().to_string(), "F12");
        assert!("Hyper+I".parse::<KeyCombo>().is_err());
        assert!("Ctrl+".parse::<KeyCombo>().is_err());
    }

    #[test]
    fn violation_kind_labels() {
        assert_eq!(ViolationKind::FullscreenExit.to_string(), "fullscreen exit");
        assert_eq!(
            ViolationKind::ForbiddenShortcut {
                combo: KeyCombo::ctrl("U")
            }
            .to_string(),
            "forbidden shortcut Ctrl+U"
        );
    }

    #[test]
    fn signal_names_parse() {
        assert_eq!(
            "exit-fullscreen".parse::<EnvironmentSignal>().unwrap(),
            EnvironmentSignal::FullscreenChanged { active: false }
        );
        assert_eq!(
            "blur".parse::<EnvironmentSignal>().unwrap(),
            EnvironmentSignal::WindowBlur
        );
        assert!("webcam".parse::<EnvironmentSignal>().is_err());
    }
}
