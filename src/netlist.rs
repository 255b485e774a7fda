//! Gate-level export of the carry expansion
//!
//! The flat expansion is a two-level AND/OR circuit. [`Netlist::from_width`]
//! lowers it to two-input gates in the JSON netlist shape used by the RHDL
//! gate-level simulators (`name`, `net_count`, `gates`, `inputs`, `outputs`,
//! `schedule`). [`NetlistSimulator`] evaluates such a netlist over 64 lanes.
//!
//! Net layout for width `n`: `a` is nets `0..n`, `b` is `n..2n`, `cin` is
//! `2n`. Every gate after that drives a fresh net, in schedule order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, NetlistError};
use crate::lanes::{lane_mask, pack_lanes, unpack_lanes};
use crate::term::{Factor, TermEnumerator};

/// Widest expansion lowered to gates. Gate count roughly quadruples every
/// two widths; width 16 is already about four million gates.
pub const MAX_NETLIST_WIDTH: usize = 16;

/// Gate types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateType {
    And,
    Or,
}

/// Gate definition from JSON netlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDef {
    #[serde(rename = "type")]
    pub gate_type: GateType,
    pub inputs: Vec<usize>,
    pub output: usize,
}

/// Complete combinational netlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    pub name: String,
    pub net_count: usize,
    pub gates: Vec<GateDef>,
    pub inputs: BTreeMap<String, Vec<usize>>,
    pub outputs: BTreeMap<String, Vec<usize>>,
    pub schedule: Vec<usize>,
}

/// Size of a netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NetlistStats {
    pub net_count: usize,
    pub gate_count: usize,
    pub and_gates: usize,
    pub or_gates: usize,
}

struct Lowering {
    gates: Vec<GateDef>,
    next_net: usize,
}

impl Lowering {
    fn gate(&mut self, gate_type: GateType, in1: usize, in2: usize) -> usize {
        let out = self.next_net;
        self.next_net += 1;
        self.gates.push(GateDef {
            gate_type,
            inputs: vec![in1, in2],
            output: out,
        });
        out
    }

    /// Left-leaning two-input chain; a single net passes straight through.
    fn chain(&mut self, gate_type: GateType, nets: &[usize]) -> usize {
        let mut acc = nets[0];
        for &net in &nets[1..] {
            acc = self.gate(gate_type, acc, net);
        }
        acc
    }
}

impl Netlist {
    /// Lower the carry expansion for operand width `width`.
    ///
    /// Outputs: `carry` (`width + 1` nets, `carry[0]` is the `cin` net) and
    /// `generate` (`width` nets, each the last product term of its width).
    pub fn from_width(width: usize) -> Result<Self, ConfigError> {
        if width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if width > MAX_NETLIST_WIDTH {
            return Err(ConfigError::WidthTooLarge {
                width,
                max: MAX_NETLIST_WIDTH,
            });
        }

        let a_nets: Vec<usize> = (0..width).collect();
        let b_nets: Vec<usize> = (width..2 * width).collect();
        let cin_net = 2 * width;

        let mut lower = Lowering {
            gates: Vec::new(),
            next_net: cin_net + 1,
        };

        let mut carry_nets = vec![cin_net];
        let mut generate_nets = Vec::with_capacity(width);

        for k in 1..=width {
            let enumerator = TermEnumerator::new(k)?;
            let mut term_nets = Vec::with_capacity(enumerator.term_count() as usize);

            for (_, term) in enumerator.terms() {
                let factor_nets: Vec<usize> = term
                    .factors()
                    .iter()
                    .map(|f| match *f {
                        Factor::A(i) => a_nets[i],
                        Factor::B(i) => b_nets[i],
                        Factor::CarryIn => cin_net,
                    })
                    .collect();
                term_nets.push(lower.chain(GateType::And, &factor_nets));
            }

            // The generate term is always enumerated last.
            generate_nets.push(term_nets[term_nets.len() - 1]);
            carry_nets.push(lower.chain(GateType::Or, &term_nets));
            debug!(width = k, terms = term_nets.len(), "lowered carry");
        }

        let mut inputs = BTreeMap::new();
        inputs.insert("a".to_string(), a_nets);
        inputs.insert("b".to_string(), b_nets);
        inputs.insert("cin".to_string(), vec![cin_net]);

        let mut outputs = BTreeMap::new();
        outputs.insert("carry".to_string(), carry_nets);
        outputs.insert("generate".to_string(), generate_nets);

        let schedule = (0..lower.gates.len()).collect();
        let netlist = Self {
            name: format!("carry_expand_{}", width),
            net_count: lower.next_net,
            gates: lower.gates,
            inputs,
            outputs,
            schedule,
        };

        info!(
            width,
            nets = netlist.net_count,
            gates = netlist.gates.len(),
            "netlist lowered"
        );
        Ok(netlist)
    }

    pub fn from_json(json: &str) -> Result<Self, NetlistError> {
        let netlist: Self =
            serde_json::from_str(json).map_err(|e| NetlistError::Parse(e.to_string()))?;
        netlist.validate()?;
        Ok(netlist)
    }

    pub fn to_json(&self) -> Result<String, NetlistError> {
        serde_json::to_string(self).map_err(|e| NetlistError::Parse(e.to_string()))
    }

    /// Check net references and gate arity.
    pub fn validate(&self) -> Result<(), NetlistError> {
        let check = |net: usize| {
            if net >= self.net_count {
                Err(NetlistError::NetOutOfRange {
                    net,
                    net_count: self.net_count,
                })
            } else {
                Ok(())
            }
        };

        for (i, gate) in self.gates.iter().enumerate() {
            if gate.inputs.len() != 2 {
                return Err(NetlistError::GateArity {
                    gate: i,
                    got: gate.inputs.len(),
                    expected: 2,
                });
            }
            gate.inputs.iter().copied().try_for_each(check)?;
            check(gate.output)?;
        }
        for nets in self.inputs.values().chain(self.outputs.values()) {
            nets.iter().copied().try_for_each(check)?;
        }
        for &idx in &self.schedule {
            if idx >= self.gates.len() {
                return Err(NetlistError::ScheduleOutOfRange {
                    gate: idx,
                    gate_count: self.gates.len(),
                });
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> NetlistStats {
        let mut stats = NetlistStats {
            net_count: self.net_count,
            gate_count: self.gates.len(),
            ..Default::default()
        };
        for gate in &self.gates {
            match gate.gate_type {
                GateType::And => stats.and_gates += 1,
                GateType::Or => stats.or_gates += 1,
            }
        }
        stats
    }
}

/// Lane-parallel evaluator for a combinational netlist.
pub struct NetlistSimulator {
    nets: Vec<u64>,
    gates: Vec<GateDef>,
    schedule: Vec<usize>,
    inputs: BTreeMap<String, Vec<usize>>,
    outputs: BTreeMap<String, Vec<usize>>,
    lanes: usize,
    lane_mask: u64,
}

impl NetlistSimulator {
    pub fn new(netlist: Netlist, lanes: usize) -> Result<Self, NetlistError> {
        netlist.validate()?;
        Ok(Self {
            nets: vec![0; netlist.net_count],
            gates: netlist.gates,
            schedule: netlist.schedule,
            inputs: netlist.inputs,
            outputs: netlist.outputs,
            lanes,
            lane_mask: lane_mask(lanes),
        })
    }

    pub fn from_json(json: &str, lanes: usize) -> Result<Self, NetlistError> {
        Self::new(Netlist::from_json(json)?, lanes)
    }

    /// Drive an input bus with per-bit lane masks.
    pub fn poke(&mut self, name: &str, masks: &[u64]) -> Result<(), NetlistError> {
        let nets = self
            .inputs
            .get(name)
            .ok_or_else(|| NetlistError::UnknownInput(name.to_string()))?;

        for (i, &net) in nets.iter().enumerate() {
            self.nets[net] = masks.get(i).copied().unwrap_or(0) & self.lane_mask;
        }
        Ok(())
    }

    /// Drive an input bus with one integer per lane.
    pub fn poke_bus(&mut self, name: &str, values: &[u64]) -> Result<(), NetlistError> {
        let width = self
            .inputs
            .get(name)
            .ok_or_else(|| NetlistError::UnknownInput(name.to_string()))?
            .len();
        let lanes = values.len().min(self.lanes);
        let masks = pack_lanes(&values[..lanes], width);
        self.poke(name, &masks)
    }

    /// Per-bit lane masks of an output bus.
    pub fn peek(&self, name: &str) -> Result<Vec<u64>, NetlistError> {
        let nets = self
            .outputs
            .get(name)
            .ok_or_else(|| NetlistError::UnknownOutput(name.to_string()))?;

        Ok(nets.iter().map(|&net| self.nets[net]).collect())
    }

    /// One integer per lane from an output bus.
    pub fn peek_bus(&self, name: &str) -> Result<Vec<u64>, NetlistError> {
        Ok(unpack_lanes(&self.peek(name)?, self.lanes))
    }

    #[inline]
    pub fn evaluate(&mut self) {
        for &gate_idx in &self.schedule {
            let gate = &self.gates[gate_idx];
            let (in1, in2) = (gate.inputs[0], gate.inputs[1]);
            self.nets[gate.output] = match gate.gate_type {
                GateType::And => self.nets[in1] & self.nets[in2],
                GateType::Or => self.nets[in1] | self.nets[in2],
            };
        }
    }

    pub fn reset(&mut self) {
        self.nets.fill(0);
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn input_names(&self) -> Vec<String> {
        self.inputs.keys().cloned().collect()
    }

    pub fn output_names(&self) -> Vec<String> {
        self.outputs.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CarryVectorBuilder;

    #[test]
    fn test_width_one_layout() {
        let n = Netlist::from_width(1).unwrap();
        // a0 & cin, b0 & cin, a0 & b0, then two ORs
        assert_eq!(n.gates.len(), 5);
        assert_eq!(n.net_count, 3 + 5);
        assert_eq!(n.outputs["carry"][0], n.inputs["cin"][0]);
        assert_eq!(n.outputs["generate"], vec![5]);
        let s = n.stats();
        assert_eq!((s.and_gates, s.or_gates), (3, 2));
    }

    #[test]
    fn test_rejects_widths_past_netlist_cap() {
        assert_eq!(
            Netlist::from_width(MAX_NETLIST_WIDTH + 1).unwrap_err(),
            ConfigError::WidthTooLarge {
                width: MAX_NETLIST_WIDTH + 1,
                max: MAX_NETLIST_WIDTH
            }
        );
        assert_eq!(Netlist::from_width(0).unwrap_err(), ConfigError::ZeroWidth);
    }

    #[test]
    fn test_json_round_trip_validates() {
        let n = Netlist::from_width(2).unwrap();
        let json = n.to_json().unwrap();
        assert!(json.contains("\"type\":\"and\""));
        assert_eq!(Netlist::from_json(&json).unwrap(), n);
    }

    #[test]
    fn test_rejects_bad_nets() {
        let json = r#"{"name":"x","net_count":2,"gates":[{"type":"and","inputs":[0,5],"output":1}],
            "inputs":{},"outputs":{},"schedule":[0]}"#;
        assert_eq!(
            Netlist::from_json(json).unwrap_err(),
            NetlistError::NetOutOfRange { net: 5, net_count: 2 }
        );
        let json = r#"{"name":"x","net_count":2,"gates":[{"type":"or","inputs":[0],"output":1}],
            "inputs":{},"outputs":{},"schedule":[0]}"#;
        assert!(matches!(
            Netlist::from_json(json),
            Err(NetlistError::GateArity { gate: 0, got: 1, expected: 2 })
        ));
    }

    #[test]
    fn test_simulator_matches_builder() {
        let width = 4;
        let mut sim = NetlistSimulator::new(Netlist::from_width(width).unwrap(), 64).unwrap();
        let builder = CarryVectorBuilder::with_width(width).unwrap();

        let a: Vec<u64> = (0..64).map(|l| (l * 7) % 16).collect();
        let b: Vec<u64> = (0..64).map(|l| (l * 11 + 3) % 16).collect();
        let cin = 0xF0F0_F0F0_0F0F_0F0Fu64;

        sim.poke_bus("a", &a).unwrap();
        sim.poke_bus("b", &b).unwrap();
        sim.poke("cin", &[cin]).unwrap();
        sim.evaluate();

        let a_bits = pack_lanes(&a, width);
        let b_bits = pack_lanes(&b, width);
        let v = builder.build(&a_bits, &b_bits, cin).unwrap();
        assert_eq!(sim.peek("carry").unwrap(), v.carry);
        assert_eq!(sim.peek("generate").unwrap(), v.generate);
    }

    #[test]
    fn test_unknown_ports() {
        let mut sim = NetlistSimulator::new(Netlist::from_width(1).unwrap(), 8).unwrap();
        assert_eq!(
            sim.poke("x", &[1]).unwrap_err(),
            NetlistError::UnknownInput("x".to_string())
        );
        assert_eq!(
            sim.peek("y").unwrap_err(),
            NetlistError::UnknownOutput("y".to_string())
        );
        assert_eq!(sim.input_names(), vec!["a", "b", "cin"]);
        assert_eq!(sim.output_names(), vec!["carry", "generate"]);
    }

    #[test]
    fn test_gate_counts() {
        let width = 3;
        let s = Netlist::from_width(width).unwrap().stats();
        // one AND per extra factor, one OR per extra term
        let and_expected: usize = (1..=width)
            .flat_map(|k| TermEnumerator::new(k).unwrap().terms())
            .map(|(_, t)| t.len() - 1)
            .sum();
        assert_eq!(s.and_gates, and_expected);
        assert_eq!(s.or_gates, (3 - 1) + (7 - 1) + (15 - 1));
        assert_eq!(s.gate_count, s.and_gates + s.or_gates);
        assert_eq!(s.net_count, 2 * width + 1 + s.gate_count);
    }
}
