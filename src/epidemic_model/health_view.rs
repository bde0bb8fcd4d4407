use super::NodeId;

/// A view on the health of the population.
///
/// The [`PopulationGraph`](super::PopulationGraph) implements it with the
/// true health states, the [`ObservationSpace`](super::ObservationSpace)
/// with what is known from testing. Scoring works on either.
pub trait HealthView
{
    fn infected_nodes(&self) -> &[NodeId];
    fn clear_nodes(&self) -> &[NodeId];
    fn immune_nodes(&self) -> &[NodeId];
    fn alive_nodes(&self) -> &[NodeId];
    fn dead_nodes(&self) -> &[NodeId];
    fn isolated_nodes(&self) -> &[NodeId];
    fn masked_nodes(&self) -> &[NodeId];

    /// number of contacts the node currently has
    fn degree(&self, node: NodeId) -> usize;

    fn population_size(&self) -> usize;
}
