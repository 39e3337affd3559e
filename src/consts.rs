//! Named constants understood by the dialogue commands.
//!
//! Each group renders as `Group.NAME` in script source when a value is known
//! and falls back to hex otherwise.

pub struct ConstGroup {
    pub name: &'static str,
    pub members: &'static [(&'static str, i64)],
}

impl ConstGroup {
    pub fn name_of(&self, value: i64) -> Option<&'static str> {
        self.members
            .iter()
            .find(|(_, member)| *member == value)
            .map(|(name, _)| *name)
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(member, _)| *member == name)
            .map(|(_, value)| *value)
    }
}

pub static BUBBLE_TYPE: ConstGroup = ConstGroup {
    name: "BubbleType",
    members: &[("NONE", 0x00), ("NORMAL", 0x01), ("SCREAMING", 0x02)],
};

pub static TAIL_TYPE: ConstGroup = ConstGroup {
    name: "TailType",
    members: &[("NONE", 0x00), ("NORMAL", 0x01), ("SCREAMING", 0x03)],
};

pub static TEXTBOX_COLOR: ConstGroup = ConstGroup {
    name: "TextboxColor",
    members: &[("NORMAL", -0x01), ("SYSTEM", 0x01)],
};

pub static SOUND: ConstGroup = ConstGroup {
    name: "Sound",
    members: &[
        ("NONE", 0x00000000),
        ("SPEECH_BOWSER", 0x0002014F),
        ("SPEECH_FAWFUL", 0x00020153),
        ("SPEECH_TOAD", 0x00024149),
    ],
};

pub static ALL_GROUPS: [&ConstGroup; 4] = [&BUBBLE_TYPE, &TAIL_TYPE, &TEXTBOX_COLOR, &SOUND];

pub fn group(name: &str) -> Option<&'static ConstGroup> {
    ALL_GROUPS.iter().copied().find(|group| group.name == name)
}

/// Actor id meaning "the actor running this script".
pub const SELF_ACTOR: i64 = -1;
