mod arbitrary;

mod demand_reads;
mod malformed;
