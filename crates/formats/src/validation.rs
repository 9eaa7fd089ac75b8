use std::collections::HashSet;
use std::fmt;

use crate::story_config::{LayerOpacityTrigger, StoryConfig};

/// Authoring error in a story configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoChapters,
    EmptyChapterId {
        index: usize,
    },
    DuplicateChapterId {
        id: String,
    },
    NonFiniteCamera {
        chapter: String,
        field: &'static str,
    },
    EmptyLayerName {
        chapter: String,
    },
    OpacityOutOfRange {
        chapter: String,
        layer: String,
        opacity: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoChapters => write!(f, "story has no chapters"),
            ConfigError::EmptyChapterId { index } => {
                write!(f, "chapter at index {index} has an empty id")
            }
            ConfigError::DuplicateChapterId { id } => write!(f, "duplicate chapter id '{id}'"),
            ConfigError::NonFiniteCamera { chapter, field } => {
                write!(f, "chapter '{chapter}': location.{field} is not a finite number")
            }
            ConfigError::EmptyLayerName { chapter } => {
                write!(f, "chapter '{chapter}': opacity trigger has an empty layer name")
            }
            ConfigError::OpacityOutOfRange {
                chapter,
                layer,
                opacity,
            } => write!(
                f,
                "chapter '{chapter}': opacity {opacity} for layer '{layer}' is outside [0, 1]"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Checks the invariants the renderer relies on. Stops at the first problem.
pub fn validate(config: &StoryConfig) -> Result<(), ConfigError> {
    if config.chapters.is_empty() {
        return Err(ConfigError::NoChapters);
    }

    let mut seen = HashSet::new();
    for (index, chapter) in config.chapters.iter().enumerate() {
        if chapter.id.is_empty() {
            return Err(ConfigError::EmptyChapterId { index });
        }
        if !seen.insert(chapter.id.as_str()) {
            return Err(ConfigError::DuplicateChapterId {
                id: chapter.id.to_string(),
            });
        }
        if let Some(field) = chapter.location.first_non_finite() {
            return Err(ConfigError::NonFiniteCamera {
                chapter: chapter.id.to_string(),
                field,
            });
        }
        for trigger in chapter
            .on_chapter_enter
            .iter()
            .chain(&chapter.on_chapter_exit)
        {
            check_trigger(chapter.id.as_str(), trigger)?;
        }
    }
    Ok(())
}

fn check_trigger(chapter: &str, trigger: &LayerOpacityTrigger) -> Result<(), ConfigError> {
    if trigger.layer.trim().is_empty() {
        return Err(ConfigError::EmptyLayerName {
            chapter: chapter.to_string(),
        });
    }
    // NaN fails the range check as well.
    if !(0.0..=1.0).contains(&trigger.opacity) {
        return Err(ConfigError::OpacityOutOfRange {
            chapter: chapter.to_string(),
            layer: trigger.layer.clone(),
            opacity: trigger.opacity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, validate};
    use crate::story_config::{Alignment, Chapter, LayerOpacityTrigger, StoryConfig};
    use foundation::{CameraState, LngLat};

    fn story(ids: &[&str]) -> StoryConfig {
        let mut config = StoryConfig::new("tok", "style", Alignment::Left);
        for id in ids {
            config
                .chapters
                .push(Chapter::new(*id, CameraState::new(LngLat::new(0.0, 0.0), 3.0)));
        }
        config
    }

    #[test]
    fn accepts_minimal_story() {
        assert_eq!(validate(&story(&["a", "b"])), Ok(()));
    }

    #[test]
    fn rejects_empty_story() {
        assert_eq!(validate(&story(&[])), Err(ConfigError::NoChapters));
    }

    #[test]
    fn rejects_duplicate_and_empty_ids() {
        assert_eq!(
            validate(&story(&["a", "a"])),
            Err(ConfigError::DuplicateChapterId { id: "a".into() })
        );
        assert_eq!(
            validate(&story(&["a", ""])),
            Err(ConfigError::EmptyChapterId { index: 1 })
        );
    }

    #[test]
    fn rejects_non_finite_zoom() {
        let mut config = story(&["a"]);
        config.chapters[0].location.zoom = f64::INFINITY;
        assert_eq!(
            validate(&config),
            Err(ConfigError::NonFiniteCamera {
                chapter: "a".into(),
                field: "zoom"
            })
        );
    }

    #[test]
    fn rejects_out_of_range_and_nan_opacity() {
        let mut config = story(&["a"]);
        config.chapters[0]
            .on_chapter_exit
            .push(LayerOpacityTrigger::new("water", 1.5));
        assert!(matches!(
            validate(&config),
            Err(ConfigError::OpacityOutOfRange { .. })
        ));

        config.chapters[0].on_chapter_exit[0].opacity = f64::NAN;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::OpacityOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_blank_layer_name() {
        let mut config = story(&["a"]);
        config.chapters[0]
            .on_chapter_enter
            .push(LayerOpacityTrigger::new(" ", 0.0));
        assert_eq!(
            validate(&config),
            Err(ConfigError::EmptyLayerName {
                chapter: "a".into()
            })
        );
    }
}
