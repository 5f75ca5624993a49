use crate::error::{self, LibResult};
use std::convert::TryFrom;

/// The named MIDI Control Change controller numbers, `0..=119` (120..=127 are reserved for
/// Channel Mode messages, which are out of scope for this crate's event taxonomy).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Control {
    BankSelect = 0,
    ModWheel = 1,
    BreathController = 2,
    Undefined3 = 3,
    FootController = 4,
    PortamentoTime = 5,
    DataEntryMsb = 6,
    ChannelVolume = 7,
    Balance = 8,
    Undefined9 = 9,
    Pan = 10,
    ExpressionController = 11,
    EffectControl1 = 12,
    EffectControl2 = 13,
    Undefined14 = 14,
    Undefined15 = 15,
    GeneralPurpose1 = 16,
    GeneralPurpose2 = 17,
    GeneralPurpose3 = 18,
    GeneralPurpose4 = 19,
    Undefined20 = 20,
    Undefined21 = 21,
    Undefined22 = 22,
    Undefined23 = 23,
    Undefined24 = 24,
    Undefined25 = 25,
    Undefined26 = 26,
    Undefined27 = 27,
    Undefined28 = 28,
    Undefined29 = 29,
    Undefined30 = 30,
    Undefined31 = 31,

    // LSBs for items 0-31.
    BankSelectLsb = 32,
    ModWheelLsb = 33,
    BreathControllerLsb = 34,
    Undefined3Lsb = 35,
    FootControllerLsb = 36,
    PortamentoTimeLsb = 37,
    DataEntryMsbLsb = 38,
    ChannelVolumeLsb = 39,
    BalanceLsb = 40,
    Undefined9Lsb = 41,
    PanLsb = 42,
    ExpressionControllerLsb = 43,
    EffectControl1Lsb = 44,
    EffectControl2Lsb = 45,
    Undefined14Lsb = 46,
    Undefined15Lsb = 47,
    GeneralPurpose1Lsb = 48,
    GeneralPurpose2Lsb = 49,
    GeneralPurpose3Lsb = 50,
    GeneralPurpose4Lsb = 51,
    Undefined20Lsb = 52,
    Undefined21Lsb = 53,
    Undefined22Lsb = 54,
    Undefined23Lsb = 55,
    Undefined24Lsb = 56,
    Undefined25Lsb = 57,
    Undefined26Lsb = 58,
    Undefined27Lsb = 59,
    Undefined28Lsb = 60,
    Undefined29Lsb = 61,
    Undefined30Lsb = 62,
    Undefined31Lsb = 63,

    DamperPedalSustain = 64,
    PortamentoOnOff = 65,
    Sostenuto = 66,
    SoftPedal = 67,
    LegatoFootswitch = 68,
    Hold2 = 69,
    SoundVariation = 70,
    HarmonicIntensity = 71,
    ReleaseTime = 72,
    AttackTime = 73,
    Brightness = 74,
    SoundControllers6 = 75,
    SoundControllers7 = 76,
    SoundControllers8 = 77,
    SoundControllers9 = 78,
    SoundControllers10 = 79,
    GeneralPurpose5 = 80,
    GeneralPurpose6 = 81,
    GeneralPurpose7 = 82,
    GeneralPurpose8 = 83,
    PortamentoControl = 84,
    Undefined85 = 85,
    Undefined86 = 86,
    Undefined87 = 87,
    Undefined88 = 88,
    Undefined89 = 89,
    Undefined90 = 90,
    Effects1Depth = 91,
    Effects2Depth = 92,
    Effects3Depth = 93,
    Effects4Depth = 94,
    Effects5Depth = 95,
    DataIncrement = 96,
    DataDecrement = 97,
    NonRegisteredParameterNumberLsb = 98,
    NonRegisteredParameterNumberMsb = 99,
    RegisteredParameterNumberLsb = 100,
    RegisteredParameterNumberMsb = 101,
    Undefined102 = 102,
    Undefined103 = 103,
    Undefined104 = 104,
    Undefined105 = 105,
    Undefined106 = 106,
    Undefined107 = 107,
    Undefined108 = 108,
    Undefined109 = 109,
    Undefined110 = 110,
    Undefined111 = 111,
    Undefined112 = 112,
    Undefined113 = 113,
    Undefined114 = 114,
    Undefined115 = 115,
    Undefined116 = 116,
    Undefined117 = 117,
    Undefined118 = 118,
    Undefined119 = 119,
}

impl Default for Control {
    fn default() -> Self {
        Control::BankSelect
    }
}

impl Control {
    pub(crate) fn try_from_u8(value: u8) -> LibResult<Self> {
        use Control::*;
        const ALL: [Control; 120] = [
            BankSelect, ModWheel, BreathController, Undefined3, FootController, PortamentoTime,
            DataEntryMsb, ChannelVolume, Balance, Undefined9, Pan, ExpressionController,
            EffectControl1, EffectControl2, Undefined14, Undefined15, GeneralPurpose1,
            GeneralPurpose2, GeneralPurpose3, GeneralPurpose4, Undefined20, Undefined21,
            Undefined22, Undefined23, Undefined24, Undefined25, Undefined26, Undefined27,
            Undefined28, Undefined29, Undefined30, Undefined31, BankSelectLsb, ModWheelLsb,
            BreathControllerLsb, Undefined3Lsb, FootControllerLsb, PortamentoTimeLsb,
            DataEntryMsbLsb, ChannelVolumeLsb, BalanceLsb, Undefined9Lsb, PanLsb,
            ExpressionControllerLsb, EffectControl1Lsb, EffectControl2Lsb, Undefined14Lsb,
            Undefined15Lsb, GeneralPurpose1Lsb, GeneralPurpose2Lsb, GeneralPurpose3Lsb,
            GeneralPurpose4Lsb, Undefined20Lsb, Undefined21Lsb, Undefined22Lsb, Undefined23Lsb,
            Undefined24Lsb, Undefined25Lsb, Undefined26Lsb, Undefined27Lsb, Undefined28Lsb,
            Undefined29Lsb, Undefined30Lsb, Undefined31Lsb, DamperPedalSustain, PortamentoOnOff,
            Sostenuto, SoftPedal, LegatoFootswitch, Hold2, SoundVariation, HarmonicIntensity,
            ReleaseTime, AttackTime, Brightness, SoundControllers6, SoundControllers7,
            SoundControllers8, SoundControllers9, SoundControllers10, GeneralPurpose5,
            GeneralPurpose6, GeneralPurpose7, GeneralPurpose8, PortamentoControl, Undefined85,
            Undefined86, Undefined87, Undefined88, Undefined89, Undefined90, Effects1Depth,
            Effects2Depth, Effects3Depth, Effects4Depth, Effects5Depth, DataIncrement,
            DataDecrement, NonRegisteredParameterNumberLsb, NonRegisteredParameterNumberMsb,
            RegisteredParameterNumberLsb, RegisteredParameterNumberMsb, Undefined102,
            Undefined103, Undefined104, Undefined105, Undefined106, Undefined107, Undefined108,
            Undefined109, Undefined110, Undefined111, Undefined112, Undefined113, Undefined114,
            Undefined115, Undefined116, Undefined117, Undefined118, Undefined119,
        ];
        match value {
            0..=119 => Ok(ALL[value as usize]),
            _ => error::UnknownEventStatus {
                site: site!(),
                byte: value,
            }
            .fail(),
        }
    }
}

impl TryFrom<u8> for Control {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(Self::try_from_u8(value)?)
    }
}
