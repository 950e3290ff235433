//! 装备：在普通背包和装备栏之间转移物品
mod transfer;
