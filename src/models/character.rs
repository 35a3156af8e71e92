//! 角色模型
//!
//! 角色创建时根据种族与职业查表计算属性，之后对核心流程只读。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 属性基础值
const BASE_SCORE: i32 = 10;

/// 新角色初始金币
const STARTING_GOLD: u32 = 100;

/// 新角色初始物品
const STARTING_INVENTORY: [&str; 3] = ["Basic equipment", "Rations", "Backpack"];

/// 定义一个由固定名称集合组成的枚举，序列化为展示名称
macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// 全部取值（按固定顺序）
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// 展示名称
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// 全部展示名称
            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| format!("unknown {}: {}", stringify!($name), s))
            }
        }
    };
}

named_enum!(
    /// 种族
    Race {
        Human => "Human",
        Elf => "Elf",
        Dwarf => "Dwarf",
        Halfling => "Halfling",
        Dragonborn => "Dragonborn",
        Gnome => "Gnome",
        HalfElf => "Half-Elf",
        HalfOrc => "Half-Orc",
        Tiefling => "Tiefling",
    }
);

named_enum!(
    /// 职业
    CharacterClass {
        Fighter => "Fighter",
        Wizard => "Wizard",
        Rogue => "Rogue",
        Cleric => "Cleric",
        Ranger => "Ranger",
        Barbarian => "Barbarian",
        Bard => "Bard",
        Druid => "Druid",
        Monk => "Monk",
        Paladin => "Paladin",
        Sorcerer => "Sorcerer",
        Warlock => "Warlock",
    }
);

named_enum!(
    /// 背景
    Background {
        Acolyte => "Acolyte",
        Criminal => "Criminal",
        FolkHero => "Folk Hero",
        Noble => "Noble",
        Sage => "Sage",
        Soldier => "Soldier",
        Charlatan => "Charlatan",
        Entertainer => "Entertainer",
        GuildArtisan => "Guild Artisan",
        Hermit => "Hermit",
        Outlander => "Outlander",
        Sailor => "Sailor",
    }
);

/// 六项能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

/// 能力值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: BASE_SCORE,
            dexterity: BASE_SCORE,
            constitution: BASE_SCORE,
            intelligence: BASE_SCORE,
            wisdom: BASE_SCORE,
            charisma: BASE_SCORE,
        }
    }
}

impl AbilityScores {
    /// 按种族加值计算
    pub fn for_race(race: Race) -> Self {
        let mut scores = Self::default();
        for (ability, bonus) in race.ability_bonuses() {
            *scores.get_mut(*ability) += bonus;
        }
        scores
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    fn get_mut(&mut self, ability: Ability) -> &mut i32 {
        match ability {
            Ability::Strength => &mut self.strength,
            Ability::Dexterity => &mut self.dexterity,
            Ability::Constitution => &mut self.constitution,
            Ability::Intelligence => &mut self.intelligence,
            Ability::Wisdom => &mut self.wisdom,
            Ability::Charisma => &mut self.charisma,
        }
    }

    /// 能力调整值，向负无穷取整
    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.get(ability) - BASE_SCORE).div_euclid(2)
    }
}

impl Race {
    /// 种族能力加值
    pub fn ability_bonuses(&self) -> &'static [(Ability, i32)] {
        use Ability::*;
        match self {
            Race::Human => &[(Strength, 1), (Dexterity, 1), (Constitution, 1)],
            Race::Elf => &[(Dexterity, 2), (Intelligence, 1)],
            Race::Dwarf => &[(Constitution, 2), (Strength, 1)],
            Race::Halfling => &[(Dexterity, 2), (Charisma, 1)],
            Race::Dragonborn => &[(Strength, 2), (Charisma, 1)],
            Race::Gnome => &[(Intelligence, 2), (Constitution, 1)],
            Race::HalfElf => &[(Charisma, 2), (Dexterity, 1)],
            Race::HalfOrc => &[(Strength, 2), (Constitution, 1)],
            Race::Tiefling => &[(Charisma, 2), (Intelligence, 1)],
        }
    }
}

impl CharacterClass {
    /// 职业基础生命值
    pub fn base_hit_points(&self) -> i32 {
        match self {
            CharacterClass::Barbarian => 14,
            CharacterClass::Fighter | CharacterClass::Paladin => 12,
            CharacterClass::Ranger => 10,
            CharacterClass::Wizard | CharacterClass::Sorcerer => 6,
            CharacterClass::Warlock
            | CharacterClass::Rogue
            | CharacterClass::Monk
            | CharacterClass::Bard
            | CharacterClass::Cleric
            | CharacterClass::Druid => 8,
        }
    }
}

/// 角色创建请求（已校验）
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterCreate {
    pub name: String,
    pub race: Race,
    pub character_class: CharacterClass,
    pub background: Background,
}

/// 角色实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// 角色唯一标识
    pub id: String,
    pub name: String,
    pub race: Race,
    pub character_class: CharacterClass,
    pub background: Background,
    pub level: u32,
    pub hit_points: i32,
    pub armor_class: i32,
    #[serde(flatten)]
    pub abilities: AbilityScores,
    pub gold: u32,
    /// 物品（有序）
    pub inventory: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Character {
    /// 创建新角色，计算能力值、生命值和护甲等级
    pub fn new(request: CharacterCreate) -> Self {
        let abilities = AbilityScores::for_race(request.race);
        let hit_points = (request.character_class.base_hit_points()
            + abilities.modifier(Ability::Constitution))
        .max(1);
        let armor_class = BASE_SCORE + abilities.modifier(Ability::Dexterity);

        Self {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            race: request.race,
            character_class: request.character_class,
            background: request.background,
            level: 1,
            hit_points,
            armor_class,
            abilities,
            gold: STARTING_GOLD,
            inventory: STARTING_INVENTORY.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    /// 角色简介，用于开场提示词
    pub fn summary(&self) -> String {
        format!(
            "{}, a {} {} with a {} background",
            self.name, self.race, self.character_class, self.background
        )
    }
}

/// 角色创建可选项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterOptions {
    pub races: Vec<String>,
    pub classes: Vec<String>,
    pub backgrounds: Vec<String>,
}

impl CharacterOptions {
    pub fn all() -> Self {
        let owned = |names: Vec<&str>| names.into_iter().map(String::from).collect();
        Self {
            races: owned(Race::names()),
            classes: owned(CharacterClass::names()),
            backgrounds: owned(Background::names()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(race: Race, class: CharacterClass) -> Character {
        Character::new(CharacterCreate {
            name: "Kael".into(),
            race,
            character_class: class,
            background: Background::Sage,
        })
    }

    #[test]
    fn test_elf_wizard_stats() {
        let kael = create(Race::Elf, CharacterClass::Wizard);
        assert_eq!(kael.abilities.dexterity, 12);
        assert_eq!(kael.abilities.intelligence, 11);
        assert_eq!(kael.abilities.constitution, 10);
        assert_eq!(kael.hit_points, 6);
        assert_eq!(kael.armor_class, 11);
        assert_eq!(kael.level, 1);
        assert_eq!(kael.gold, 100);
        assert_eq!(kael.inventory, vec!["Basic equipment", "Rations", "Backpack"]);
    }

    #[test]
    fn test_constitution_bonus_adds_hit_points() {
        let dwarf = create(Race::Dwarf, CharacterClass::Barbarian);
        assert_eq!(dwarf.abilities.constitution, 12);
        assert_eq!(dwarf.abilities.strength, 11);
        assert_eq!(dwarf.hit_points, 15);
        assert_eq!(dwarf.armor_class, 10);
    }

    #[test]
    fn test_modifier_floors_toward_negative_infinity() {
        let mut scores = AbilityScores::default();
        scores.dexterity = 9;
        assert_eq!(scores.modifier(Ability::Dexterity), -1);
        scores.dexterity = 11;
        assert_eq!(scores.modifier(Ability::Dexterity), 0);
        scores.dexterity = 8;
        assert_eq!(scores.modifier(Ability::Dexterity), -1);
        scores.dexterity = 7;
        assert_eq!(scores.modifier(Ability::Dexterity), -2);
    }

    #[test]
    fn test_enum_names_round_trip() {
        assert_eq!("Half-Orc".parse::<Race>(), Ok(Race::HalfOrc));
        assert_eq!(Background::GuildArtisan.to_string(), "Guild Artisan");
        assert!("Necromancer".parse::<CharacterClass>().is_err());
        assert_eq!(
            serde_json::to_value(Background::FolkHero).unwrap(),
            serde_json::json!("Folk Hero")
        );
    }

    #[test]
    fn test_options_cover_all_tables() {
        let options = CharacterOptions::all();
        assert_eq!(options.races.len(), 9);
        assert_eq!(options.classes.len(), 12);
        assert_eq!(options.backgrounds.len(), 12);
        assert_eq!(options.races[6], "Half-Elf");
    }

    #[test]
    fn test_character_serializes_flat_abilities() {
        let kael = create(Race::Elf, CharacterClass::Wizard);
        let value = serde_json::to_value(&kael).unwrap();
        assert_eq!(value["dexterity"], 12);
        assert_eq!(value["race"], "Elf");
        assert_eq!(value["character_class"], "Wizard");

        let back: Character = serde_json::from_value(value).unwrap();
        assert_eq!(back, kael);
    }
}
