/*!
The musical-time model: [`Time`], [`TimeNode`], and [`TimeSpecification`] (the "node map"). This is
the piece that lets the rest of the crate talk about a position in a sequence either as raw
cumulative ticks or as a `(bar, beat, tick)` triple, without every caller re-deriving the tempo and
time-signature arithmetic by hand.

Positions are tracked internally as an integer musical-time coordinate `v`, scaled so that it is
invariant under tempo and division changes: `VPT` value-per-tick, `VPQN` value-per-quarter-note,
`VPN` value-per-whole-note (the constants a [`TimeNode`] uses to convert `v` deltas into bars, beats
and ticks).
!*/

use crate::core::tempo::Tempo;
use crate::core::time_division::TimeDivision;
use crate::core::time_signature::TimeSignature;
use crate::error::{self, LibResult};
use snafu::ensure;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Value-per-tick: the number of internal musical-value units in a single "canonical" MIDI tick
/// (i.e. a tick at an assumed 480 pulses-per-quarter-note resolution).
pub(crate) const VPT: i64 = 16;

/// Value-per-quarter-note.
pub(crate) const VPQN: i64 = VPT * 480;

/// Value-per-whole-note.
pub(crate) const VPN: i64 = VPQN * 4;

/// A point on the timeline where tempo or time signature changes. Nodes are owned, in order, by a
/// [`TimeSpecification`]; a node's `bar`/`beat`/`tick` describe its own position (derived from the
/// preceding node when the map was built), not an offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeNode {
    v: i64,
    bar: u32,
    beat: u32,
    tick: u32,
    cumulative: i64,
    tempo: Tempo,
    signature: TimeSignature,
}

impl TimeNode {
    fn origin() -> Self {
        TimeNode {
            v: 0,
            bar: 1,
            beat: 1,
            tick: 0,
            cumulative: 0,
            tempo: Tempo::default(),
            signature: TimeSignature::default(),
        }
    }

    /// Internal musical-value coordinate of this node.
    pub fn v(&self) -> i64 {
        self.v
    }

    /// Bar (measure) number, 1-based.
    pub fn bar(&self) -> u32 {
        self.bar
    }

    /// Beat number within the bar, 1-based.
    pub fn beat(&self) -> u32 {
        self.beat
    }

    /// Tick within the beat, 0-based, in canonical (480-PPQN-equivalent) units.
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Ticks from the start of the sequence, in the file's actual division.
    pub fn cumulative(&self) -> i64 {
        self.cumulative
    }

    /// The tempo in force starting at this node.
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// The time signature in force starting at this node.
    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    /// Musical-value per pulse (tick): how many `v` units one tick of the file's division is worth.
    /// In PPQN mode this is constant; in PPS (SMPTE) mode it additionally depends on this node's
    /// tempo, since SMPTE ticks are a function of wall-clock time, not beats.
    pub(crate) fn vpp(&self, division: TimeDivision) -> f64 {
        match division {
            TimeDivision::Ppqn(ppqn) => VPQN as f64 / ppqn as f64,
            TimeDivision::Pps(_) => {
                let pps = division.pps_value().expect("division is Pps");
                VPQN as f64 / (pps / self.tempo.bps())
            }
        }
    }

    /// `(ticks-per-measure, ticks-per-beat)` in `v` units, derived from this node's signature.
    fn vpm_vpb(&self) -> (i64, i64) {
        let num = self.signature.numerator() as i64;
        let den = self.signature.denominator() as i64;
        (VPN * num / den, VPN / den)
    }

    /// Derives the `(bar, beat, tick)` triple for a target value `target_v`, assumed to be `>= self.v`
    /// and governed by this node's signature (i.e. `self` is the node immediately preceding
    /// `target_v`).
    fn triple_at(&self, target_v: i64) -> (u32, u32, u32) {
        let delta = target_v - self.v;
        let (vpm, vpb) = self.vpm_vpb();
        let bar = self.bar as i64 + delta.div_euclid(vpm);
        let beat = self.beat as i64 + delta.rem_euclid(vpm).div_euclid(vpb);
        let tick = self.tick as i64 + (delta.rem_euclid(vpb) as f64 / VPT as f64).round() as i64;
        (bar as u32, beat as u32, tick as u32)
    }
}

/// Ordered, piecewise-constant map of tempo/signature regions along a sequence's timeline. Every
/// position conversion a [`Time`] performs (value ↔ cumulative ↔ triple) consults this map.
#[derive(Clone, Debug)]
pub struct TimeSpecification {
    division: TimeDivision,
    nodes: Vec<TimeNode>,
}

impl TimeSpecification {
    /// Builds a fresh node map for the given division, seeded with the default first node:
    /// `v=0, bar=1, beat=1, tick=0`, 120 BPM, 4/4.
    pub fn new(division: TimeDivision) -> Self {
        TimeSpecification {
            division,
            nodes: vec![TimeNode::origin()],
        }
    }

    /// The file's time division, fixed for the lifetime of the specification.
    pub fn division(&self) -> TimeDivision {
        self.division
    }

    /// All nodes, in `v`-ascending order.
    pub fn nodes(&self) -> &[TimeNode] {
        &self.nodes
    }

    fn node_for_v(&self, v: i64) -> &TimeNode {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.v <= v)
            .unwrap_or(&self.nodes[0])
    }

    fn node_for_cumulative(&self, cumulative: i64) -> &TimeNode {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.cumulative <= cumulative)
            .unwrap_or(&self.nodes[0])
    }

    fn node_for_triple(&self, bar: u32, beat: u32, tick: u32) -> &TimeNode {
        self.nodes
            .iter()
            .rev()
            .find(|n| (n.bar, n.beat, n.tick) <= (bar, beat, tick))
            .unwrap_or(&self.nodes[0])
    }

    /// Converts a cumulative tick offset into the internal musical value `v`.
    pub fn v_for_cumulative(&self, cumulative: i64) -> i64 {
        let node = self.node_for_cumulative(cumulative);
        let delta = cumulative - node.cumulative;
        let vpp = node.vpp(self.division);
        node.v + (delta as f64 * vpp).round() as i64
    }

    /// Converts an internal musical value `v` into a cumulative tick offset.
    pub fn cumulative_for_v(&self, v: i64) -> i64 {
        let node = self.node_for_v(v);
        let delta = v - node.v;
        let vpp = node.vpp(self.division);
        node.cumulative + (delta as f64 / vpp).round() as i64
    }

    /// Converts an internal musical value `v` into a `(bar, beat, tick)` triple.
    pub fn triple_for_v(&self, v: i64) -> (u32, u32, u32) {
        self.node_for_v(v).triple_at(v)
    }

    /// Converts a `(bar, beat, tick)` triple into the internal musical value `v`. Fails with
    /// `TimeOutOfRange` if `bar < 1`, or `beat`/`tick` fall outside the range allowed by the
    /// signature governing that position.
    pub fn v_for_triple(&self, bar: u32, beat: u32, tick: u32) -> LibResult<i64> {
        ensure!(
            bar >= 1,
            error::TimeOutOfRange {
                site: site!(),
                description: "bar must be >= 1",
            }
        );
        let node = *self.node_for_triple(bar, beat, tick);
        let num = node.signature.numerator() as u32;
        let den = node.signature.denominator() as u32;
        ensure!(
            beat >= 1 && beat <= num,
            error::TimeOutOfRange {
                site: site!(),
                description: format!("beat must be in 1..={}", num),
            }
        );
        let max_tick = 1920 / den;
        ensure!(
            tick < max_tick,
            error::TimeOutOfRange {
                site: site!(),
                description: format!("tick must be < {}", max_tick),
            }
        );
        let (vpm, vpb) = node.vpm_vpb();
        let v = node.v
            + (bar as i64 - node.bar as i64) * vpm
            + (beat as i64 - node.beat as i64) * vpb
            + (tick as i64 - node.tick as i64) * VPT;
        Ok(v)
    }

    /// Derives the node that would immediately precede musical value `v`, with tempo and signature
    /// inherited from whichever node currently governs `v`. Used to materialize a new node at a
    /// tempo- or signature-change point before one of its fields is overwritten.
    fn derive_node_at(&self, v: i64, cumulative: i64) -> TimeNode {
        let prev = self.node_for_v(v);
        let (bar, beat, tick) = prev.triple_at(v);
        TimeNode {
            v,
            bar,
            beat,
            tick,
            cumulative,
            tempo: prev.tempo,
            signature: prev.signature,
        }
    }

    /// Records a tempo change at `cumulative`. If a node already exists at the resulting `v`
    /// (i.e. a prior change landed on the exact same instant), its tempo is updated in place;
    /// otherwise a new node is appended.
    pub(crate) fn set_tempo_at(&mut self, cumulative: i64, tempo: Tempo) {
        let v = self.v_for_cumulative(cumulative);
        if let Some(last) = self.nodes.last_mut() {
            if last.v == v {
                last.tempo = tempo;
                return;
            }
        }
        let mut node = self.derive_node_at(v, cumulative);
        node.tempo = tempo;
        self.nodes.push(node);
    }

    /// Records a time-signature change at `cumulative`, following the same in-place-or-append rule
    /// as [`Self::set_tempo_at`].
    pub(crate) fn set_signature_at(&mut self, cumulative: i64, signature: TimeSignature) {
        let v = self.v_for_cumulative(cumulative);
        if let Some(last) = self.nodes.last_mut() {
            if last.v == v {
                last.signature = signature;
                return;
            }
        }
        let mut node = self.derive_node_at(v, cumulative);
        node.signature = signature;
        self.nodes.push(node);
    }

    /// The tempo in force at cumulative tick `cumulative`.
    pub(crate) fn tempo_at_cumulative(&self, cumulative: i64) -> Tempo {
        self.node_for_cumulative(cumulative).tempo
    }

    /// The signature in force at cumulative tick `cumulative`.
    pub(crate) fn signature_at_cumulative(&self, cumulative: i64) -> TimeSignature {
        self.node_for_cumulative(cumulative).signature
    }
}

/// A position on the timeline. May be "bound" to a [`TimeSpecification`] (in which case it can be
/// converted to cumulative ticks or a musical triple) or "floating" (only its internal value `v` is
/// meaningful; attempting a triple/cumulative conversion fails with `TripleWithoutSpecification`).
///
/// Equality and ordering compare the internal value `v` only: two `Time`s are equal if they mark
/// the same musical instant, independent of which specification (if any) they are bound to.
#[derive(Clone, Debug)]
pub struct Time {
    v: i64,
    cumulative: Option<i64>,
    spec: Option<Rc<RefCell<TimeSpecification>>>,
}

impl Default for Time {
    fn default() -> Self {
        Time::from_value(0)
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.v == other.v
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.v.cmp(&other.v)
    }
}

impl Time {
    /// Builds a floating `Time` from a raw internal value. Not bound to any specification.
    pub fn from_value(v: i64) -> Self {
        Time {
            v,
            cumulative: None,
            spec: None,
        }
    }

    pub(crate) fn bound(v: i64, spec: Rc<RefCell<TimeSpecification>>) -> Self {
        let cumulative = spec.borrow().cumulative_for_v(v);
        Time {
            v,
            cumulative: Some(cumulative),
            spec: Some(spec),
        }
    }

    /// Builds a `Time` from a cumulative tick offset, bound to `spec`.
    pub fn from_cumulative(cumulative: i64, spec: Rc<RefCell<TimeSpecification>>) -> Self {
        let v = spec.borrow().v_for_cumulative(cumulative);
        Time {
            v,
            cumulative: Some(cumulative),
            spec: Some(spec),
        }
    }

    /// Builds a `Time` from a `(bar, beat, tick)` triple, bound to `spec`. Fails with
    /// `TimeOutOfRange` if the triple is invalid for the signature governing that position.
    pub fn from_triple(
        bar: u32,
        beat: u32,
        tick: u32,
        spec: Rc<RefCell<TimeSpecification>>,
    ) -> LibResult<Self> {
        let v = spec.borrow().v_for_triple(bar, beat, tick)?;
        let cumulative = spec.borrow().cumulative_for_v(v);
        Ok(Time {
            v,
            cumulative: Some(cumulative),
            spec: Some(spec),
        })
    }

    /// Binds a previously floating `Time` to `spec`, eagerly computing and caching `cumulative`.
    pub fn bind(&mut self, spec: Rc<RefCell<TimeSpecification>>) {
        let cumulative = spec.borrow().cumulative_for_v(self.v);
        self.cumulative = Some(cumulative);
        self.spec = Some(spec);
    }

    /// `true` if this `Time` is bound to a specification.
    pub fn is_bound(&self) -> bool {
        self.spec.is_some()
    }

    /// The internal musical-value coordinate. Invariant under tempo/division changes.
    pub fn value(&self) -> i64 {
        self.v
    }

    /// Ticks from the start of the sequence. Requires this `Time` to be bound.
    pub fn cumulative(&self) -> LibResult<i64> {
        self.cumulative.context_triple()
    }

    /// The `(bar, beat, tick)` triple for this position. Requires this `Time` to be bound.
    pub fn triple(&self) -> LibResult<(u32, u32, u32)> {
        let spec = self
            .spec
            .as_ref()
            .ok_or_else(|| error::TripleWithoutSpecification { site: site!() }.build())?;
        Ok(spec.borrow().triple_for_v(self.v))
    }

    /// The bar component of [`Self::triple`].
    pub fn bar(&self) -> LibResult<u32> {
        Ok(self.triple()?.0)
    }

    /// The beat component of [`Self::triple`].
    pub fn beat(&self) -> LibResult<u32> {
        Ok(self.triple()?.1)
    }

    /// The tick component of [`Self::triple`].
    pub fn tick(&self) -> LibResult<u32> {
        Ok(self.triple()?.2)
    }
}

// Small helper so `Time::cumulative` reads as a single expression; `Option::context_triple` isn't
// a standard method, so we define it privately for this one call site.
trait OptionTripleExt<T> {
    fn context_triple(self) -> LibResult<T>;
}

impl<T> OptionTripleExt<T> for Option<T> {
    fn context_triple(self) -> LibResult<T> {
        self.ok_or_else(|| error::TripleWithoutSpecification { site: site!() }.build())
    }
}

impl std::ops::Add<i64> for Time {
    type Output = Time;

    fn add(self, rhs: i64) -> Time {
        let v = self.v + rhs;
        match self.spec {
            Some(spec) => Time::bound(v, spec),
            None => Time::from_value(v),
        }
    }
}

impl std::ops::Sub<i64> for Time {
    type Output = Time;

    fn sub(self, rhs: i64) -> Time {
        let v = self.v - rhs;
        match self.spec {
            Some(spec) => Time::bound(v, spec),
            None => Time::from_value(v),
        }
    }
}

impl std::ops::Sub<Time> for Time {
    type Output = i64;

    fn sub(self, rhs: Time) -> i64 {
        self.v - rhs.v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clocks::Clocks;

    fn spec_with_signature(num: u8, den: u8) -> Rc<RefCell<TimeSpecification>> {
        let mut spec = TimeSpecification::new(TimeDivision::ppqn(480).unwrap());
        spec.set_signature_at(0, TimeSignature::new(num, den, Clocks::Quarter, 8).unwrap());
        Rc::new(RefCell::new(spec))
    }

    #[test]
    fn three_eight_edge_below_bar() {
        let spec = spec_with_signature(3, 8);
        let v = spec.borrow().v_for_cumulative(719);
        let triple = spec.borrow().triple_for_v(v);
        assert_eq!(triple, (1, 3, 239));
    }

    #[test]
    fn three_eight_edge_at_bar() {
        let spec = spec_with_signature(3, 8);
        let v = spec.borrow().v_for_cumulative(720);
        let triple = spec.borrow().triple_for_v(v);
        assert_eq!(triple, (2, 1, 0));
    }

    #[test]
    fn tempo_change_mid_track() {
        let mut spec = TimeSpecification::new(TimeDivision::ppqn(480).unwrap());
        spec.set_tempo_at(0, Tempo::from_bpm(120.0).unwrap());
        spec.set_tempo_at(960, Tempo::from_bpm(150.0).unwrap());
        assert_eq!(spec.nodes().len(), 2);
        let tempo_at_note = spec.tempo_at_cumulative(1440);
        assert_eq!(tempo_at_note.bpm(), 150.0);
    }

    #[test]
    fn unbound_time_rejects_triple() {
        let time = Time::from_value(100);
        assert!(time.triple().is_err());
        assert!(time.cumulative().is_err());
    }

    #[test]
    fn bound_time_round_trips_cumulative() {
        let spec = TimeSpecification::new(TimeDivision::ppqn(480).unwrap());
        let spec = Rc::new(RefCell::new(spec));
        let time = Time::from_cumulative(960, spec.clone());
        assert_eq!(time.cumulative().unwrap(), 960);
        assert_eq!(time.triple().unwrap(), (1, 3, 0));
    }

    #[test]
    fn time_ordering_by_value() {
        let a = Time::from_value(10);
        let b = Time::from_value(20);
        assert!(a < b);
        assert_eq!(b - a, 10);
    }
}
