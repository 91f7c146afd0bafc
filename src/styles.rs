//! Static catalog of narrative styles.
//!
//! Each style carries the display data shown in the picker and the instruction
//! fragment injected into every prompt of a session using it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator};

#[derive(
  Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
  EnumIter, EnumString, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AdventureStyle {
  #[default]
  Fantasy,
  Scifi,
  Modern,
  Apocalyptic,
  Cyberpunk,
  Steampunk,
  Historical,
}

#[derive(Clone, Debug, Serialize)]
pub struct StyleDescriptor {
  pub id: AdventureStyle,
  #[serde(rename = "displayName")]
  pub display_name: &'static str,
  pub description: &'static str,
  #[serde(skip)]
  pub prompt_fragment: &'static str,
}

impl AdventureStyle {
  pub fn descriptor(self) -> StyleDescriptor {
    let (display_name, description, prompt_fragment) = match self {
      AdventureStyle::Fantasy => (
        "Fantasy",
        "Dragons, magic, and medieval adventures",
        "Create an immersive fantasy world where magical elements serve as metaphors for learning concepts. Use rich descriptions of mystical environments, magical creatures, and enchanted items to illustrate educational points.",
      ),
      AdventureStyle::Scifi => (
        "Sci-Fi",
        "Space exploration and futuristic technology",
        "Set the learning experience aboard an advanced starship or space station, using futuristic technology and scientific phenomena to explain concepts. Include detailed descriptions of advanced technology and space environments.",
      ),
      AdventureStyle::Modern => (
        "Modern",
        "Contemporary urban adventures",
        "Frame the learning experience in a vivid contemporary setting, using detailed descriptions of urban environments, modern technology, and real-world scenarios to illustrate concepts.",
      ),
      AdventureStyle::Apocalyptic => (
        "Apocalyptic",
        "Survive in a post-apocalyptic world",
        "Create a compelling post-apocalyptic world where knowledge is crucial for survival. Use detailed descriptions of the changed environment and survival challenges to frame learning concepts.",
      ),
      AdventureStyle::Cyberpunk => (
        "Cyberpunk",
        "High tech, low life in neon-lit cities",
        "Set the scene in a neon-lit, high-tech dystopia where information and technology reign supreme. Use detailed descriptions of digital landscapes and advanced cyber-systems to explain concepts.",
      ),
      AdventureStyle::Steampunk => (
        "Steampunk",
        "Victorian-era technology and adventure",
        "Create an alternate Victorian world filled with brass, steam, and mechanical marvels. Use detailed descriptions of ingenious contraptions and mechanical processes to illustrate learning concepts.",
      ),
      AdventureStyle::Historical => (
        "Historical",
        "Real historical events and settings",
        "Transport learners to richly detailed historical settings, connecting concepts to significant events and discoveries. Include vivid descriptions of historical environments and authentic period details.",
      ),
    };
    StyleDescriptor { id: self, display_name, description, prompt_fragment }
  }
}

/// Every style, in picker order.
pub fn catalog() -> Vec<StyleDescriptor> {
  AdventureStyle::iter().map(AdventureStyle::descriptor).collect()
}

/// Style fragments after applying TOML overrides. Read-only once built.
#[derive(Clone, Debug, Default)]
pub struct StyleFragments {
  overrides: HashMap<AdventureStyle, String>,
}

impl StyleFragments {
  pub fn new(overrides: HashMap<AdventureStyle, String>) -> Self {
    Self { overrides }
  }

  pub fn fragment(&self, style: AdventureStyle) -> &str {
    match self.overrides.get(&style) {
      Some(s) if !s.trim().is_empty() => s.as_str(),
      _ => style.descriptor().prompt_fragment,
    }
  }
}
